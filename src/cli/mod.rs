pub mod command;
pub mod drive;
pub mod interleave;
pub mod resample;

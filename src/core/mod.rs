pub mod process;
pub mod tools;
pub mod ytdlp;

pub mod check;
pub mod init;
pub mod sync;
pub mod watch;

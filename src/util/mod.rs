pub mod password;
pub mod multipart;

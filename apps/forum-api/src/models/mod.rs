pub mod channel;
pub mod comment;
pub mod name_list;
pub mod settings;
pub mod thread;
pub mod user;

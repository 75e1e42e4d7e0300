pub mod book;
pub mod catalog;
pub mod isbn;
pub mod lenient;
pub mod library;
pub mod rating;
pub mod status;
pub mod text;
pub mod timestamp;
pub mod user;

//! HTML front end

pub mod handlers;

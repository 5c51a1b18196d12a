pub mod cache;
pub mod city;
pub mod history;
pub mod user;

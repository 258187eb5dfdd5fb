//! Blogicum - A small multi-author blog
//!
//! This library provides posts grouped by category and location, comments,
//! user profiles and the server-rendered pages that tie them together.

pub mod config;
pub mod db;
pub mod models;
pub mod services;
pub mod theme;
pub mod web;

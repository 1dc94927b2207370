//! afbridge Core
//!
//! Core types shared by the afbridge scheduler adapter, its farm client and
//! the report channel.
//!
//! This crate contains:
//! - Domain types: work items, farm job descriptions, poll snapshots
//! - DTOs: report channel request/response bodies
//! - Token vocabulary and path localization used on both sides of the farm

pub mod domain;
pub mod dto;
pub mod paths;
pub mod tokens;

//! Data models for Flockhub entities.
//!
//! This module contains the data structures shared by every client surface:
//!
//! - `Person`, `Church`, `Ministry`: people and the organizations they belong to
//! - `Team`, `TeamMember`: volunteer teams and their rosters
//! - `Service`, `Schedule`: worship services and volunteer assignments
//! - `Attendance`, `CheckIn`: check-in records
//! - `Communication`: announcements sent to members
//! - `ChurchRole`, `TeamRole`: role enums with display labels
//!
//! With the `ts` feature enabled each type also derives a TypeScript
//! definition for the web and mobile surfaces.

pub mod attendance;
pub mod church;
pub mod communication;
pub mod person;
pub mod role;
pub mod service;
pub mod team;

pub use attendance::{Attendance, CheckIn};
pub use church::{Church, Ministry};
pub use communication::{Channel, Communication};
pub use person::Person;
pub use role::{ChurchRole, TeamRole};
pub use service::{Schedule, ScheduleStatus, Service};
pub use team::{Team, TeamMember};

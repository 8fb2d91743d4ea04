//! Weather widget - a bounded, persisted list of tracked cities with current
//! weather for the selected one.
//!
//! The library exposes the widget's modules for the binary and for testing.

pub mod action;
pub mod api;
pub mod city;
pub mod components;
pub mod config;
pub mod effect;
pub mod forecast;
pub mod geo;
pub mod http;
pub mod logging;
pub mod manager;
pub mod reducer;
pub mod services;
pub mod state;
pub mod store;

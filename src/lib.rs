//! dialsnap: photograph a printed phone or USSD code, crop it, OCR it and dial it
//!
//! The [`session::Controller`] drives the whole flow over pluggable camera,
//! OCR and dialer backends; [`server`] serves the page assets.

pub mod capture;
pub mod config;
pub mod crop;
pub mod dial;
pub mod domain;
pub mod localize;
pub mod recognition;
pub mod server;
pub mod session;

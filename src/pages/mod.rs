//! Routed views of the tracker.
//!
//! # Routes
//! ```text
//! /                       index
//! /login, /register       auth forms
//! /dashboard              summary per strategy
//! /strategies             list        /strategies/add     create
//! /strategies/edit/{id}   edit        /strategies/{id}    detail
//! /assets                 list        /assets/add         create
//! /assets/edit/{id}       edit
//! /admin                  lookup tables (admins only)
//! anything else           not found
//! ```
//!
//! # Design Decisions
//! - Auth and role guards live in each page's `init`, never in the router
//! - Edit patterns are registered before the detail pattern they overlap

pub mod admin;
pub mod asset_add;
pub mod asset_edit;
pub mod assets;
pub mod attachments;
pub mod common;
pub mod dashboard;
pub mod index;
pub mod login;
pub mod not_found;
pub mod register;
pub mod strategies;
pub mod strategy;
pub mod strategy_add;
pub mod strategy_edit;

use std::sync::Arc;

use crate::routing::{PatternError, RouteTable};

/// The application's route table.
pub fn build_route_table() -> Result<RouteTable, PatternError> {
    let table = RouteTable::builder(Arc::new(not_found::NotFoundPage))
        .exact("/", Arc::new(index::IndexPage))
        .exact("/dashboard", Arc::new(dashboard::DashboardPage))
        .exact("/login", Arc::new(login::LoginPage))
        .exact("/register", Arc::new(register::RegisterPage))
        .exact("/strategies", Arc::new(strategies::StrategiesPage))
        .exact("/strategies/add", Arc::new(strategy_add::StrategyAddPage))
        .exact("/assets", Arc::new(assets::AssetsPage))
        .exact("/assets/add", Arc::new(asset_add::AssetAddPage))
        .exact("/admin", Arc::new(admin::AdminPage))
        .pattern("/strategies/edit/{id}", Arc::new(strategy_edit::StrategyEditPage))?
        .pattern("/strategies/{id}", Arc::new(strategy::StrategyPage))?
        .pattern("/assets/edit/{id}", Arc::new(asset_edit::AssetEditPage))?
        .build();
    Ok(table)
}

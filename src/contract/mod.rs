// src/contract/mod.rs
//! Option contracts: construction, parameter overrides and trading calendars.

pub mod calendar;
pub mod option;
pub mod params;

pub use calendar::{TradingCalendar, WeekdayCalendar, TRADING_DAYS_PER_YEAR};
pub use option::{OptionBuilder, OptionContract, PositionDirection};
pub use params::{GridOverrides, Param, ParamOverrides};

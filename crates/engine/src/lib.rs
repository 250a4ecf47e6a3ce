//! Mask marketplace engine.
//!
//! The engine owns the store and exposes:
//!
//! - the purchase transaction ([`Engine::purchase`]), which moves money from a
//!   member to a pharmacy and appends a purchase record atomically;
//! - opening-hours parsing and evaluation ([`OpeningHours`], [`is_open`]);
//! - the read queries behind the HTTP reports (open pharmacies, mask counts,
//!   search, sales summary, top members);
//! - the offline import of the seed JSON files.
//!
//! Balances and prices are [`Money`] values (integer minor units).

pub use commands::{
    CountOperator, DateRange, MaskCountFilter, MaskSort, MaskSortKey, PurchaseCmd, SalesFilter,
    SearchQuery, SearchScope, SortOrder, TopMembersFilter,
};
pub use error::{EngineError, MissingRef};
pub use import::{HistoryRecord, ImportSummary, MaskRecord, MemberRecord, PharmacyRecord};
pub use masks::Mask;
pub use members::Member;
pub use money::Money;
pub use opening_hours::{ClockTime, HoursSource, Interval, OpeningHours, WEEKDAYS, is_open};
pub use ops::{
    Engine, EngineBuilder, MemberSpending, PharmacyMaskCount, Receipt, SalesDetail, SalesSummary,
    SearchHit,
};
pub use pharmacies::Pharmacy;
pub use purchase_histories::PurchaseHistory;

mod commands;
mod error;
mod import;
mod masks;
mod members;
mod money;
pub mod opening_hours;
mod ops;
mod pharmacies;
mod purchase_histories;

pub type ResultEngine<T> = Result<T, EngineError>;

//! Domain models with validation at construction
//!
//! Request bodies deserialize into `New*`/`*Patch` inputs and must pass
//! `Validate` before they reach the store. Invalid input returns
//! `ValidationError`, not panic.

pub mod validation;
pub mod record;
pub mod contact;
pub mod site;
pub mod establishment;
pub mod meter;
pub mod billing;
pub mod mpesa;
pub mod occupancy;
pub mod activity;
pub mod pagination;
pub mod redact;

pub use validation::ValidationError;
pub use record::{Column, Columns, Record, Validate};
pub use contact::{Admin, Client, ContactPatch, NewContact};
pub use site::{
    EstablishmentType, EstablishmentTypePatch, NewEstablishmentType, NewOperationMode, NewSite,
    OperationMode, OperationModePatch, Site, SitePatch,
};
pub use establishment::{Establishment, EstablishmentPatch, NewEstablishment};
pub use meter::{Meter, MeterListing, MeterPatch, NewMeter, ValveRequest, ValveStatus};
pub use billing::{BillingProfile, BillingProfilePatch, NewBillingProfile};
pub use mpesa::{AccountType, MpesaKey, MpesaKeyPatch, NewMpesaKey};
pub use occupancy::{
    NewOccupancy, Occupancy, OccupancyFilter, OccupancyListing, OccupancyPatch, OccupancyStatus,
};
pub use activity::{
    Event, EventPatch, EventType, NewEvent, NewTransaction, Transaction, TransactionPatch,
    TransactionStatus,
};
pub use pagination::{Pagination, PaginationParams};
pub use redact::redact;

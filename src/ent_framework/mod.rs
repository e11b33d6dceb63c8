// Ent Framework - access control over blog mutations

pub mod ent_privacy;

pub use ent_privacy::{
    login_redirect, PrivacyContext, PrivacyDecision, PrivacyOperation, PrivacyPolicy,
};

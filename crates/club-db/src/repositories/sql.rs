//! Shared SQL fragments
//!
//! Kept as macros so they can be spliced into `concat!` and the final query
//! text stays `&'static str`.

/// Column list of `members` under the alias `m`
macro_rules! member_columns {
    () => {
        "m.id, m.handle, m.external_id, m.phone, m.community, m.joined_at, m.expires_at, \
         m.active, m.invite_link, m.expiry_warning_sent, m.removal_pending, m.created_at, \
         m.updated_at"
    };
}

/// Identity rule: same external id OR same handle.
/// Binds the external id as `$1` and the handle as `$2`; either may be NULL.
macro_rules! identity_match {
    () => {
        "(($1::BIGINT IS NOT NULL AND m.external_id = $1::BIGINT) \
         OR ($2::TEXT IS NOT NULL AND m.handle = $2::TEXT))"
    };
}

/// The row has at least one completed payment
macro_rules! has_completed_payment {
    () => {
        "EXISTS (SELECT 1 FROM payments p WHERE p.member_id = m.id AND p.status = 'completed')"
    };
}

/// Column list of `payments`
macro_rules! payment_columns {
    () => {
        "id, member_id, amount, status, order_ref, created_at, updated_at"
    };
}

pub(crate) use {has_completed_payment, identity_match, member_columns, payment_columns};

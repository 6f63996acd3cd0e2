//! Access predicate push-down.
//!
//! Turns the access half of an [`EffectiveFilter`](tracker_search::EffectiveFilter)
//! into a WHERE condition so only permitted rows ever leave the database.
//!
//! # Policy
//! 1. Global grant of the required permission → no restriction
//! 2. Project grants → `project_col IN (...)`
//! 3. Ticket grants → `(project_col = p AND seq_col IN (...))` per project
//! 4. Grants from 2 and 3 are ORed
//! 5. Nothing granted → deny all (`false`)

use std::collections::BTreeMap;

use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, Condition, EntityTrait};
use tracker_search::AccessFilter;

/// Entities whose rows are governed by project and ticket scoped grants.
pub trait AccessScopedEntity: EntityTrait {
    /// Column holding the owning project id.
    fn project_col() -> Self::Column;

    /// Column holding the per-project ticket number, if rows are tickets.
    /// Entities without one are only reachable through project or global
    /// grants.
    fn ticket_seq_col() -> Option<Self::Column>;
}

/// Build the access condition for `access` over `E`.
#[must_use]
pub fn build_access_condition<E>(access: &AccessFilter) -> Condition
where
    E: AccessScopedEntity,
    E::Column: ColumnTrait + Copy,
{
    let deny_all = || Condition::all().add(Expr::value(false));

    if access.is_unrestricted() {
        return Condition::all();
    }

    let mut any = Condition::any();
    let mut granted = false;

    let projects = access.granted_projects();
    if !projects.is_empty() {
        any = any.add(Expr::col(E::project_col()).is_in(projects.iter().map(|p| p.0)));
        granted = true;
    }

    if let Some(seq_col) = E::ticket_seq_col() {
        let mut by_project: BTreeMap<i64, Vec<i64>> = BTreeMap::new();
        for ticket in access.granted_tickets() {
            by_project
                .entry(ticket.project.0)
                .or_default()
                .push(ticket.seq);
        }
        for (project, seqs) in by_project {
            any = any.add(
                Condition::all()
                    .add(Expr::col(E::project_col()).eq(project))
                    .add(Expr::col(seq_col).is_in(seqs)),
            );
            granted = true;
        }
    }

    if granted { any } else { deny_all() }
}

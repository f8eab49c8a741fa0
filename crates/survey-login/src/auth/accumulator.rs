//! Functional enrichment of claims.
//!
//! Every function here takes claims by reference and returns a new value. Callers
//! re-issue a token from the result and hand it back to the client.

use super::{AuthError, Claims, UnitGrant};
use crate::store::Questionnaire;

/// Bind `respondent_units` to the given grants.
///
/// Questionnaires already attached to a unit that is granted again are carried
/// over, so re-fetching units never drops earlier enrichment.
pub fn with_units(claims: &Claims, units: Vec<UnitGrant>) -> Claims {
    let previous = claims.respondent_units.as_deref().unwrap_or_default();

    let units = units
        .into_iter()
        .map(|mut grant| {
            if grant.questionnaires.is_none() {
                grant.questionnaires = previous
                    .iter()
                    .find(|p| p.reference == grant.reference)
                    .and_then(|p| p.questionnaires.clone());
            }
            grant
        })
        .collect();

    Claims {
        respondent_units: Some(units),
        ..claims.clone()
    }
}

/// Look up a granted unit by exact reference.
///
/// All grants are scanned; a reference matching any of them is accepted.
pub fn granted_unit<'a>(claims: &'a Claims, reference: &str) -> Result<&'a UnitGrant, AuthError> {
    claims
        .require_units()?
        .iter()
        .find(|grant| grant.reference == reference)
        .ok_or_else(|| AuthError::AccessDenied(format!("Unit {} not granted", reference)))
}

/// Attach questionnaires to the granted unit with the given reference.
pub fn with_questionnaires(
    claims: &Claims,
    reference: &str,
    questionnaires: Vec<Questionnaire>,
) -> Result<Claims, AuthError> {
    granted_unit(claims, reference)?;

    let units = claims
        .respondent_units
        .iter()
        .flatten()
        .map(|grant| {
            if grant.reference == reference {
                UnitGrant {
                    questionnaires: Some(questionnaires.clone()),
                    ..grant.clone()
                }
            } else {
                grant.clone()
            }
        })
        .collect();

    Ok(Claims {
        respondent_units: Some(units),
        ..claims.clone()
    })
}

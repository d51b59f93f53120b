//! Request data transfer objects.

use crate::error::ApiError;
use crate::facility::FacilityPatch;
use axum::{
    async_trait,
    extract::{FromRequest, Request},
    Json,
};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use staffgate_access::{PrincipalKind, PrincipalRef};
use staffgate_audit_types::{AuditFilter, PageRequest};
use staffgate_common_core::PrincipalId;
use validator::Validate;

/// JSON body that has passed `validator` checks.
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
        value.validate()?;
        Ok(Self(value))
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct StartImpersonationRequest {
    #[validate(length(min = 1, max = 64))]
    pub target_user_id: String,
    #[validate(length(min = 1, max = 32))]
    pub target_user_type: String,
}

impl StartImpersonationRequest {
    pub fn target(&self) -> Result<PrincipalRef, ApiError> {
        let id = PrincipalId::parse(&self.target_user_id)
            .map_err(|_| ApiError::BadRequest(format!("invalid targetUserId '{}'", self.target_user_id)))?;
        let kind = self
            .target_user_type
            .parse::<PrincipalKind>()
            .map_err(|_| ApiError::BadRequest(format!("unknown targetUserType '{}'", self.target_user_type)))?;
        Ok(PrincipalRef::new(id, kind))
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFacilityRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    #[validate(length(max = 500))]
    pub address: Option<String>,
    pub active: Option<bool>,
}

impl From<UpdateFacilityRequest> for FacilityPatch {
    fn from(req: UpdateFacilityRequest) -> Self {
        Self {
            name: req.name,
            address: req.address,
            active: req.active,
        }
    }
}

/// Query string for `GET /audit`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditListParams {
    pub actor_id: Option<String>,
    pub original_actor_id: Option<String>,
    pub resource: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl AuditListParams {
    pub fn into_query(self) -> Result<(AuditFilter, PageRequest), ApiError> {
        let principal = |name: &str, raw: Option<String>| -> Result<Option<PrincipalId>, ApiError> {
            raw.map(|value| PrincipalId::parse(&value).map_err(|_| ApiError::InvalidQueryParam(name.to_string())))
                .transpose()
        };

        if let (Some(from), Some(to)) = (self.from, self.to) {
            if from > to {
                return Err(ApiError::InvalidQueryParam("from".into()));
            }
        }

        let defaults = PageRequest::default();
        let filter = AuditFilter {
            actor_id: principal("actorId", self.actor_id)?,
            original_actor_id: principal("originalActorId", self.original_actor_id)?,
            resource: self.resource.filter(|r| !r.is_empty()),
            from: self.from,
            to: self.to,
        };
        let page = PageRequest::new(
            self.page.unwrap_or(defaults.page),
            self.per_page.unwrap_or(defaults.per_page),
        );
        Ok((filter, page))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_parses_kind_and_id() {
        let id = PrincipalId::new();
        let req = StartImpersonationRequest {
            target_user_id: id.to_string(),
            target_user_type: "employee".into(),
        };
        assert_eq!(req.target().unwrap(), PrincipalRef::new(id, PrincipalKind::Employee));

        let bad = StartImpersonationRequest {
            target_user_id: id.to_string(),
            target_user_type: "robot".into(),
        };
        assert!(matches!(bad.target(), Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn test_empty_target_fails_validation() {
        let req = StartImpersonationRequest {
            target_user_id: String::new(),
            target_user_type: "user".into(),
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_audit_params_build_query() {
        let actor = PrincipalId::new();
        let params = AuditListParams {
            actor_id: Some(actor.to_string()),
            resource: Some("facilities".into()),
            per_page: Some(500),
            ..Default::default()
        };

        let (filter, page) = params.into_query().unwrap();
        assert_eq!(filter.actor_id, Some(actor));
        assert_eq!(filter.resource.as_deref(), Some("facilities"));
        assert_eq!(page.page(), 1);
        assert_eq!(page.limit(), 100);
    }

    #[test]
    fn test_audit_params_reject_bad_input() {
        let params = AuditListParams {
            original_actor_id: Some("nope".into()),
            ..Default::default()
        };
        assert!(matches!(params.into_query(), Err(ApiError::InvalidQueryParam(p)) if p == "originalActorId"));

        let now = Utc::now();
        let params = AuditListParams {
            from: Some(now),
            to: Some(now - chrono::Duration::minutes(1)),
            ..Default::default()
        };
        assert!(params.into_query().is_err());
    }
}

use std::future::{ready, Ready};

use actix_web::{
    dev::Payload, error::ErrorUnauthorized, Error, FromRequest, HttpMessage, HttpRequest,
};

use crate::middleware::auth::Claims;
use crate::services::collaboration_service::Participant;

/// Identity placed in the request by [`AuthMiddleware`](crate::middleware::auth::AuthMiddleware).
#[derive(Clone)]
pub struct AuthenticatedUser {
    pub user_id: String,
    pub email: String,
    pub name: String,
}

impl AuthenticatedUser {
    pub fn participant(&self) -> Participant {
        Participant {
            id: self.user_id.clone(),
            name: self.name.clone(),
        }
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        if let Some(claims) = req.extensions().get::<Claims>() {
            let name = if claims.name.trim().is_empty() {
                claims.sub.split('@').next().unwrap_or_default().to_string()
            } else {
                claims.name.clone()
            };
            ready(Ok(AuthenticatedUser {
                user_id: claims.user_id.clone(),
                email: claims.sub.clone(),
                name,
            }))
        } else {
            ready(Err(ErrorUnauthorized("User not authenticated")))
        }
    }
}

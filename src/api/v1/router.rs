use super::handler::{self, REFRESH_COOKIE_NAME};
use crate::server::Server;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use warp::Filter;

pub fn routes(
    server: Arc<Server>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    // Path before method, so an unknown path stays a 404 rather than a 405.
    let health = warp::path("health")
        .and(warp::path::end())
        .and(warp::get())
        .and_then(handler::health);

    let login = warp::path!("auth" / "login")
        .and(warp::get())
        .and(login_query())
        .and(warp::addr::remote())
        .and(with(server.auth_service.clone()))
        .and(with_timeout(server.request_timeout))
        .and_then(handler::login);

    let refresh = warp::path!("auth" / "refresh")
        .and(warp::get())
        .and(warp::cookie::optional::<String>(REFRESH_COOKIE_NAME))
        .and(warp::addr::remote())
        .and(with(server.auth_service.clone()))
        .and(with_timeout(server.request_timeout))
        .and_then(handler::refresh);

    let logout = warp::path!("auth" / "logout")
        .and(warp::post())
        .and(warp::cookie::optional::<String>(REFRESH_COOKIE_NAME))
        .and(with(server.auth_service.clone()))
        .and(with_timeout(server.request_timeout))
        .and_then(handler::logout);

    health.or(login).or(refresh).or(logout)
}

/// A request without any query string is treated as one without an `id`.
fn login_query() -> impl Filter<Extract = (handler::LoginQuery,), Error = Infallible> + Clone {
    warp::query::<handler::LoginQuery>()
        .or(warp::any().map(|| handler::LoginQuery { id: None }))
        .unify()
}

fn with<ServiceType>(
    service: Arc<ServiceType>,
) -> impl Filter<Extract = (Arc<ServiceType>,), Error = Infallible> + Clone
where
    ServiceType: Send + Sync + ?Sized,
{
    warp::any().map(move || service.clone())
}

fn with_timeout(timeout: Duration) -> impl Filter<Extract = (Duration,), Error = Infallible> + Clone {
    warp::any().map(move || timeout)
}

use super::*;
use crate::accounts::*;
use crate::hub::*;
use crate::*;
use actix_cors::Cors;
use actix_web::App;
use actix_web::HttpRequest;
use actix_web::HttpResponse;
use actix_web::HttpServer;
use actix_web::middleware::Logger;
use actix_web::web;
use std::sync::Arc;

pub struct Server;

impl Server {
    pub async fn run(config: Config) -> anyhow::Result<()> {
        let bind = config.bind.clone();
        let workers = config.workers;
        let accounts: Arc<dyn Accounts> = Arc::new(MemoryAccounts::default());
        let hub = web::Data::new(HubHandle::spawn(config, accounts));
        log::info!("starting hosting server on {}", bind);
        HttpServer::new(move || {
            App::new()
                .wrap(Logger::new("%r %s %Ts"))
                .wrap(
                    Cors::default()
                        .allow_any_origin()
                        .allow_any_method()
                        .allow_any_header(),
                )
                .app_data(hub.clone())
                .route("/health", web::get().to(health))
                .route("/quiz/play", web::get().to(play))
                .route("/quiz/host", web::get().to(host))
        })
        .workers(workers)
        .bind(bind)?
        .run()
        .await?;
        Ok(())
    }
}

#[derive(Debug, serde::Deserialize)]
pub struct PlayQuery {
    pub user_id: String,
    pub username: Option<String>,
}

#[derive(Debug, serde::Deserialize)]
pub struct HostQuery {
    pub token: Option<String>,
}

async fn health() -> HttpResponse {
    HttpResponse::Ok().body("ok")
}

async fn play(
    hub: web::Data<HubHandle>,
    query: web::Query<PlayQuery>,
    body: web::Payload,
    req: HttpRequest,
) -> HttpResponse {
    let PlayQuery { user_id, username } = query.into_inner();
    let user = UserId::from(user_id.trim());
    if user.as_str().is_empty() {
        return HttpResponse::BadRequest().body("user_id is required");
    }
    let name = username
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| user.to_string());
    if let Err(e) = charge_entry(&hub, &user).await {
        log::info!("[hosting] {} refused: {}", user, e);
        return HttpResponse::PaymentRequired().body(e.to_string());
    }
    match actix_ws::handle(&req, body) {
        Ok((response, session, stream)) => {
            let peer = PlayerPeer::new(user.clone(), name);
            let socket = Socket::new(session, stream);
            match Connection::open(peer, hub.get_ref().clone(), socket).await {
                Ok(()) => response,
                Err(e) => {
                    refund_entry(&hub, &user).await;
                    HttpResponse::ServiceUnavailable().body(e.to_string())
                }
            }
        }
        Err(e) => {
            refund_entry(&hub, &user).await;
            e.error_response()
        }
    }
}

async fn host(
    hub: web::Data<HubHandle>,
    query: web::Query<HostQuery>,
    body: web::Payload,
    req: HttpRequest,
) -> HttpResponse {
    if !hub.config().admits_host(query.token.as_deref()) {
        log::warn!("[hosting] host refused: bad token");
        return HttpResponse::Unauthorized().body("invalid host token");
    }
    match actix_ws::handle(&req, body) {
        Ok((response, session, stream)) => {
            let socket = Socket::new(session, stream);
            match Connection::open(HostPeer, hub.get_ref().clone(), socket).await {
                Ok(()) => response,
                Err(e) => HttpResponse::ServiceUnavailable().body(e.to_string()),
            }
        }
        Err(e) => e.error_response(),
    }
}

/// Debits the configured entry fee from the user's persistent balance.
async fn charge_entry(hub: &HubHandle, user: &UserId) -> Result<(), AccountsError> {
    let fee = hub.config().entry_fee;
    if fee.is_zero() {
        return Ok(());
    }
    let balance = hub.accounts().balance(user).await?;
    if balance < fee {
        return Err(AccountsError::Insufficient {
            user: user.clone(),
            balance,
            requested: fee,
        });
    }
    hub.accounts()
        .adjust(user, Adjustment::Debit(fee))
        .await
        .map(|left| log::debug!("[hosting] {} paid entry {}, {} left", user, fee, left))
}

async fn refund_entry(hub: &HubHandle, user: &UserId) {
    let fee = hub.config().entry_fee;
    if !fee.is_zero() {
        if let Err(e) = hub.accounts().adjust(user, Adjustment::Credit(fee)).await {
            log::error!("[hosting] entry refund to {} failed: {}", user, e);
        }
    }
}

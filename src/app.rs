use std::net::TcpListener;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use actix_cors::Cors;
use actix_web::dev::Server;
use actix_web::http::{header, Method};
use actix_web::{get, HttpResponse, Responder};
use actix_web::{web, App, HttpServer};

use anyhow::Context;

use sqlx::postgres::PgPoolOptions;

use tracing_actix_web::TracingLogger;

use crate::admin::BookingAdmin;
use crate::client::EmailClient;
use crate::controller::{bookings, submissions};
use crate::error::RestError;
use crate::notify::{BookingNotifier, EmailNotifier};
use crate::repo::{BookingStore, InMemoryBookingStore, PgBookingStore};
use crate::settings::{DatabaseSettings, Settings, StorageBackend};
use crate::workflow::BookingWorkflow;

/// Liveness endpoint
#[tracing::instrument(name = "Ping")]
#[get("/ping")]
async fn ping() -> impl Responder {
    HttpResponse::Ok().body("Server awake")
}

/// Run the application on a specified TCP listener
pub fn run(
    listener: TcpListener,
    workflow: BookingWorkflow,
    admin: BookingAdmin,
    static_dir: Option<PathBuf>,
) -> anyhow::Result<Server> {
    // Wrap application data
    let workflow = web::Data::new(workflow);
    let admin = web::Data::new(admin);

    // Start the server
    let server = HttpServer::new(move || {
        // Only the admin endpoints extract typed JSON, `/book` reads its body leniently
        let json_config = web::JsonConfig::default()
            .content_type_required(false)
            .error_handler(|error, _req| RestError::ParseError(error.to_string()).into());

        let app = App::new()
            .wrap(TracingLogger::default())
            .wrap(cors())
            .app_data(json_config)
            .app_data(workflow.clone())
            .app_data(admin.clone())
            .service(ping)
            .service(submissions::service())
            .service(bookings::scope());

        // Anything not matching an API route falls through to the front end
        match &static_dir {
            Some(dir) => app.service(actix_files::Files::new("/", dir).index_file("index.html")),
            None => app,
        }
    })
    .listen(listener)?
    .run();

    Ok(server)
}

/// Build the production dependencies from settings and run the application
pub async fn build(settings: &Settings) -> anyhow::Result<Server> {
    let store_timeout = settings.app.store_timeout();
    let store = connect_store(&settings.database, store_timeout).await;

    let email_client = EmailClient::new(settings.email.sender()?, settings.email.api()?)?;
    let notifier: Arc<dyn BookingNotifier> = Arc::new(EmailNotifier::new(
        email_client,
        settings.email.recipient(),
        settings.email.owner()?,
    )?);

    let workflow = BookingWorkflow::new(
        store.clone(),
        notifier,
        store_timeout,
        settings.app.notify_timeout(),
    );
    let admin = BookingAdmin::new(store, store_timeout);

    let listener = TcpListener::bind(settings.app.addr()).context("Failed to bind listener")?;
    tracing::info!(addr = ?listener.local_addr()?, "Listening");

    run(
        listener,
        workflow,
        admin,
        settings.app.static_dir().map(PathBuf::from),
    )
}

/// Open the booking store.
/// The Postgres pool connects lazily; an unreachable database is logged and retried on demand
async fn connect_store(
    settings: &DatabaseSettings,
    store_timeout: Duration,
) -> Arc<dyn BookingStore> {
    match settings.backend {
        StorageBackend::Memory => {
            tracing::warn!("Using the in-memory booking store, bookings are lost on restart");
            Arc::new(InMemoryBookingStore::new())
        }
        StorageBackend::Postgres => {
            let pool = PgPoolOptions::new()
                .acquire_timeout(store_timeout)
                .connect_lazy_with(settings.with_statement_timeout(store_timeout));

            match pool.acquire().await {
                Ok(_) => tracing::info!("Database connected"),
                Err(error) => tracing::error!(
                    error.cause_chain = ?error,
                    "Database unreachable at startup, will retry on demand"
                ),
            }

            Arc::new(PgBookingStore::new(pool))
        }
    }
}

fn cors() -> Cors {
    Cors::default()
        .allow_any_origin()
        .allowed_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allowed_header(header::CONTENT_TYPE)
}

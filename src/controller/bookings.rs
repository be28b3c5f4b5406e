use actix_web::dev::HttpServiceFactory;
use actix_web::{delete, get, put, web, HttpResponse, Responder};

use serde_json::json;

use uuid::Uuid;

use crate::admin::BookingAdmin;
use crate::error::{AdminError, RestError, RestResult};
use crate::model::Schedule;

const NOT_FOUND: &str = "Booking not found";

/// List endpoint, newest bookings first
#[tracing::instrument(name = "List bookings", skip(admin))]
#[get("")]
async fn list(admin: web::Data<BookingAdmin>) -> RestResult<impl Responder> {
    let bookings = admin.list().await.map_err(|error| {
        tracing::error!(error.cause_chain = ?error, "Failed to fetch bookings");
        RestError::FetchError("Error fetching bookings".into())
    })?;

    Ok(HttpResponse::Ok().json(bookings))
}

/// Reschedule endpoint, only the date and time of a booking can change
#[tracing::instrument(name = "Reschedule a booking", skip(admin))]
#[put("/{id}")]
async fn reschedule(
    admin: web::Data<BookingAdmin>,
    path: web::Path<(String,)>,
    body: web::Json<Schedule>,
) -> RestResult<impl Responder> {
    let (id,) = path.into_inner();
    let id = parse_id(&id)?;

    admin
        .reschedule(id, body.into_inner())
        .await
        .map_err(|error| admin_error(error, "Update error"))?;

    Ok(HttpResponse::Ok().json(json!({ "message": "Booking updated successfully" })))
}

#[tracing::instrument(name = "Delete a booking", skip(admin))]
#[delete("/{id}")]
async fn remove(
    admin: web::Data<BookingAdmin>,
    path: web::Path<(String,)>,
) -> RestResult<impl Responder> {
    let (id,) = path.into_inner();
    let id = parse_id(&id)?;

    admin
        .remove(id)
        .await
        .map_err(|error| admin_error(error, "Delete error"))?;

    Ok(HttpResponse::Ok().json(json!({ "message": "Booking deleted successfully" })))
}

/// No booking can have an ID that isn't a UUID
fn parse_id(id: &str) -> RestResult<Uuid> {
    id.parse().map_err(|_| RestError::NotFound(NOT_FOUND.into()))
}

fn admin_error(error: AdminError, failure: &str) -> RestError {
    match error {
        AdminError::NotFound(_) => RestError::NotFound(NOT_FOUND.into()),
        AdminError::Store(error) => {
            tracing::error!(error.cause_chain = ?error, "{}", failure);
            RestError::InternalError(failure.into())
        }
    }
}

/// Bookings administration endpoints
pub fn scope() -> impl HttpServiceFactory {
    web::scope("/bookings")
        .service(list)
        .service(reschedule)
        .service(remove)
}

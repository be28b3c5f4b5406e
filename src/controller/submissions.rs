use actix_web::dev::HttpServiceFactory;
use actix_web::http::StatusCode;
use actix_web::{post, web, HttpResponse, Responder};

use crate::model::BookingSubmission;
use crate::workflow::{BookingWorkflow, SubmitOutcome, SubmitResponse};

/// Booking submission endpoint.
/// The response is decided by validation and persistence only.
/// NOTE: The body is read as JSON regardless of its content type, so that every
/// unusable submission is answered with `{accepted, reason}` rather than a parse error
#[tracing::instrument(name = "Book an appointment", skip(workflow, body))]
#[post("/book")]
async fn book(workflow: web::Data<BookingWorkflow>, body: web::Bytes) -> impl Responder {
    let outcome = workflow.submit(BookingSubmission::from_body(&body)).await;

    let status = match outcome {
        SubmitOutcome::Accepted(_) => StatusCode::OK,
        SubmitOutcome::Rejected(_) => StatusCode::BAD_REQUEST,
        SubmitOutcome::Failed => StatusCode::INTERNAL_SERVER_ERROR,
    };

    HttpResponse::build(status).json(SubmitResponse::from(&outcome))
}

pub fn service() -> impl HttpServiceFactory {
    book
}

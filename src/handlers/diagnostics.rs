use axum::{
    extract::{rejection::FormRejection, State},
    response::Json,
    Extension, Form,
};
use tracing::{error, info};

use super::AppState;
use crate::error::AppResult;
use crate::models::{ProviderTestForm, ProviderTestResponse, RequestContext};
use crate::services::PromptPayload;

/// Sends a short text straight to the model, without the clinician instruction.
/// A missing or unreadable form falls back to the default greeting.
pub async fn test_provider_handler(
    State(state): State<AppState>,
    Extension(context): Extension<RequestContext>,
    form: Result<Form<ProviderTestForm>, FormRejection>,
) -> AppResult<Json<ProviderTestResponse>> {
    let form = form.map(|Form(form)| form).unwrap_or_default();
    let prompt = PromptPayload::raw(form.prompt());

    info!(
        request_id = %context.request_id,
        provider = state.model.name(),
        prompt_chars = prompt.char_count(),
        "Provider diagnostic requested"
    );

    match state.model.generate(&prompt).await {
        Ok(response) => Ok(Json(ProviderTestResponse { response })),
        Err(e) => {
            error!(request_id = %context.request_id, error = %e, "Provider diagnostic failed");
            Err(e)
        }
    }
}

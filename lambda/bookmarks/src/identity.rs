use lambda_http::request::RequestContext;
use lambda_http::{Request, RequestExt};

const SUBJECT_CLAIM: &str = "sub";

/// The verified user id injected by the gateway's JWT authorizer.
///
/// `None` when the claim is missing or empty; such requests are rejected
/// rather than scoped to an empty partition key.
pub(crate) fn user_id(event: &Request) -> Option<&str> {
    let Some(RequestContext::ApiGatewayV2(ctx)) = event.request_context_ref() else {
        return None;
    };

    ctx.authorizer
        .as_ref()?
        .jwt
        .as_ref()?
        .claims
        .get(SUBJECT_CLAIM)
        .map(String::as_str)
        .filter(|sub| !sub.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http_handler::tests::EventBuilder;

    #[test]
    fn test_should_read_sub_claim() {
        let event = EventBuilder::new("GET /bookmarks").user("u1").build();
        assert_eq!(user_id(&event), Some("u1"));
    }

    #[test]
    fn test_should_reject_missing_or_empty_sub() {
        let event = EventBuilder::new("GET /bookmarks").build();
        assert_eq!(user_id(&event), None);

        let event = EventBuilder::new("GET /bookmarks").user("").build();
        assert_eq!(user_id(&event), None);
    }
}

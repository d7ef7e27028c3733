//! Replayed HTTP traffic for the SDK client tests.

use aws_config::{BehaviorVersion, SdkConfig};
use aws_sdk_s3::config::{Credentials, Region, SharedCredentialsProvider};
use aws_smithy_http_client::test_util::{ReplayEvent, StaticReplayClient};
use aws_smithy_runtime_api::http::{Request, Response, StatusCode};
use aws_smithy_types::body::SdkBody;

/// SDK configuration whose every call is answered by `client`.
pub fn sdk_config(client: &StaticReplayClient) -> SdkConfig {
    SdkConfig::builder()
        .behavior_version(BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(SharedCredentialsProvider::new(Credentials::new(
            "AKIDEXECUTIONROLE",
            "execution-secret",
            None,
            None,
            "test",
        )))
        .http_client(client.clone())
        .build()
}

/// One canned response; the recorded request is not compared.
pub fn response(status: u16, content_type: &str, body: &str) -> ReplayEvent {
    let mut response = Response::new(
        StatusCode::try_from(status).unwrap(),
        SdkBody::from(body.to_string()),
    );
    response
        .headers_mut()
        .insert("Content-Type", content_type.to_string());
    ReplayEvent::new(Request::new(SdkBody::empty()), response)
}

/// Body of the `index`th request the client received, as text.
pub fn request_body(client: &StaticReplayClient, index: usize) -> String {
    let request = client.actual_requests().nth(index).unwrap();
    String::from_utf8(request.body().bytes().unwrap().to_vec()).unwrap()
}

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::{
    application::models::feed::{build_profile, FeedSubject, PublicUser, RecsRequest, RecsResponse},
    application::models::profile::Profile,
    application::models::rating::{MessageRequest, RatingRequest},
    config::Config,
    constants::{MESSAGE_PATH, PUBLIC_USERS_PATH, RATE_PATH, RECS_PATH},
    error::AppError,
    session::credential::Credential,
    transport::http_client::HingeHttpClient,
};

/// One page of recommendations, already joined with public profile data.
/// `parse_failures` counts entries the server sent that could not be
/// turned into a [`Profile`].
#[derive(Debug, Default)]
pub struct RecBatch {
    pub profiles: Vec<Profile>,
    pub parse_failures: usize,
}

/// Access to the recommendation feed and the actions it enables
#[async_trait]
pub trait RecommendationService: Send + Sync {
    /// Fetches the next page of recommendations for the logged-in user
    async fn fetch_page(&self, credential: &Credential) -> Result<RecBatch, AppError>;

    /// Likes a profile, optionally attaching a comment
    async fn like_profile(
        &self,
        credential: &Credential,
        profile: &Profile,
        comment: Option<&str>,
    ) -> Result<(), AppError>;

    /// Sends a chat message to a matched profile
    async fn send_message(
        &self,
        credential: &Credential,
        subject_id: &str,
        message: &str,
    ) -> Result<(), AppError>;
}

pub struct RecommendationServiceImpl<T: HingeHttpClient> {
    config: Arc<Config>,
    client: Arc<T>,
}

impl<T: HingeHttpClient> RecommendationServiceImpl<T> {
    pub fn new(config: Arc<Config>, client: Arc<T>) -> Self {
        Self { config, client }
    }

    /// Parses feed subjects one at a time so a single malformed entry
    /// costs only itself, not the page.
    fn collect_subjects(&self, response: RecsResponse) -> (Vec<FeedSubject>, usize) {
        let mut subjects = Vec::new();
        let mut failures = 0;
        for feed in response.feeds {
            for raw in feed.subjects {
                match serde_json::from_value::<FeedSubject>(raw.clone()) {
                    Ok(subject) => subjects.push(subject),
                    Err(e) => {
                        warn!("Skipping unparseable feed subject: {} ({})", e, raw);
                        failures += 1;
                    }
                }
            }
        }
        (subjects, failures)
    }

    async fn fetch_public_users(
        &self,
        credential: &Credential,
        ids: &[String],
    ) -> Result<(HashMap<String, PublicUser>, usize), AppError> {
        let path = format!("{}?ids={}", PUBLIC_USERS_PATH, ids.join(","));
        let raw_users: Vec<Value> = self.client.get_json(&path, credential).await?;

        let mut users = HashMap::new();
        let mut failures = 0;
        for raw in raw_users {
            match serde_json::from_value::<PublicUser>(raw.clone()) {
                Ok(user) => {
                    users.insert(user.identity_id.clone(), user);
                }
                Err(e) => {
                    warn!("Skipping unparseable public user: {} ({})", e, raw);
                    failures += 1;
                }
            }
        }
        Ok((users, failures))
    }
}

#[async_trait]
impl<T: HingeHttpClient + 'static> RecommendationService for RecommendationServiceImpl<T> {
    async fn fetch_page(&self, credential: &Credential) -> Result<RecBatch, AppError> {
        let request = RecsRequest {
            player_id: credential.user_id.clone(),
            active_today: self.config.scrape.active_today,
            new_here: self.config.scrape.new_here,
        };

        info!("Fetching recommendations for user {}", credential.user_id);
        let response: RecsResponse = self
            .client
            .post_json(RECS_PATH, &request, Some(credential))
            .await?;

        let (subjects, mut parse_failures) = self.collect_subjects(response);
        if subjects.is_empty() {
            debug!("Recommendation page came back empty");
            return Ok(RecBatch {
                profiles: Vec::new(),
                parse_failures,
            });
        }

        let ids: Vec<String> = subjects.iter().map(|s| s.subject_id.clone()).collect();
        debug!("Resolving {} public profiles", ids.len());
        let (users, user_failures) = self.fetch_public_users(credential, &ids).await?;
        parse_failures += user_failures;

        let mut profiles = Vec::with_capacity(subjects.len());
        for subject in &subjects {
            match users.get(&subject.subject_id) {
                Some(user) => profiles.push(build_profile(subject, user)),
                None => {
                    warn!("No public profile returned for {}", subject.subject_id);
                    parse_failures += 1;
                }
            }
        }

        info!(
            "Assembled {} profiles ({} entries skipped)",
            profiles.len(),
            parse_failures
        );
        Ok(RecBatch {
            profiles,
            parse_failures,
        })
    }

    async fn like_profile(
        &self,
        credential: &Credential,
        profile: &Profile,
        comment: Option<&str>,
    ) -> Result<(), AppError> {
        let session_id = credential.session_id.clone().unwrap_or_default();
        let request = RatingRequest::like(
            &profile.interaction.subject_id,
            &profile.interaction.rating_token,
            &session_id,
            comment,
        );

        info!("Liking profile {}", profile.profile_id);
        self.client
            .post_no_content(RATE_PATH, &request, Some(credential))
            .await
    }

    async fn send_message(
        &self,
        credential: &Credential,
        subject_id: &str,
        message: &str,
    ) -> Result<(), AppError> {
        let request = MessageRequest::new(subject_id, message);

        info!("Sending message to {}", subject_id);
        self.client
            .post_no_content(MESSAGE_PATH, &request, Some(credential))
            .await
    }
}

#[cfg(test)]
mod tests_recommendation {
    use super::*;
    use crate::transport::http_client::HingeRestClient;
    use crate::utils::logger::setup_logger;
    use chrono::Utc;
    use mockito::{Matcher, Server};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn create_test_config(server_url: &str) -> Config {
        let mut config = Config::new();
        config.rest_api.base_url = server_url.to_string();
        config.rest_api.timeout = 5;
        config
    }

    fn create_credential() -> Credential {
        Credential {
            phone_number: "+15550001111".to_string(),
            device_id: "device".to_string(),
            install_id: "install".to_string(),
            auth_token: "tok-1".to_string(),
            session_id: Some("sess-1".to_string()),
            user_id: "player-1".to_string(),
            issued_at: Utc::now(),
            expires_at: None,
        }
    }

    fn create_service(server: &Server) -> RecommendationServiceImpl<HingeRestClient> {
        let config = Arc::new(create_test_config(&server.url()));
        let client = Arc::new(HingeRestClient::new(&config).unwrap());
        RecommendationServiceImpl::new(config, client)
    }

    #[tokio::test]
    async fn test_fetch_page_joins_profiles() {
        setup_logger();
        let mut server = Server::new_async().await;

        let recs_mock = server
            .mock("POST", "/rec/v2")
            .match_body(Matcher::Json(json!({
                "playerId": "player-1",
                "activeToday": false,
                "newHere": false
            })))
            .with_status(200)
            .with_body(
                json!({
                    "feeds": [{
                        "subjects": [
                            {"subjectId": "a", "ratingToken": "ta"},
                            {"subjectId": "b", "ratingToken": "tb"}
                        ]
                    }]
                })
                .to_string(),
            )
            .create_async()
            .await;
        let users_mock = server
            .mock("GET", "/user/v2/public")
            .match_query(Matcher::UrlEncoded("ids".into(), "a,b".into()))
            .with_status(200)
            .with_body(
                json!([
                    {"identityId": "a", "profile": {"firstName": "Ada", "age": 28}},
                    {"identityId": "b", "profile": {"firstName": "Bea", "age": 31}}
                ])
                .to_string(),
            )
            .create_async()
            .await;

        let service = create_service(&server);
        let batch = service.fetch_page(&create_credential()).await.unwrap();

        assert_eq!(batch.profiles.len(), 2);
        assert_eq!(batch.parse_failures, 0);
        assert_eq!(batch.profiles[0].profile_id, "a");
        assert_eq!(batch.profiles[0].info.first_name, "Ada");
        assert_eq!(batch.profiles[1].interaction.rating_token, "tb");

        recs_mock.assert_async().await;
        users_mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_page_skips_bad_entries() {
        setup_logger();
        let mut server = Server::new_async().await;

        let _recs = server
            .mock("POST", "/rec/v2")
            .with_status(200)
            .with_body(
                json!({
                    "feeds": [{
                        "subjects": [
                            {"subjectId": "a", "ratingToken": "ta"},
                            {"bogus": 1},
                            {"subjectId": "c", "ratingToken": "tc"}
                        ]
                    }]
                })
                .to_string(),
            )
            .create_async()
            .await;
        let _users = server
            .mock("GET", "/user/v2/public")
            .match_query(Matcher::UrlEncoded("ids".into(), "a,c".into()))
            .with_status(200)
            .with_body(
                json!([
                    {"identityId": "a", "profile": {"firstName": "Ada"}}
                ])
                .to_string(),
            )
            .create_async()
            .await;

        let service = create_service(&server);
        let batch = service.fetch_page(&create_credential()).await.unwrap();

        // One bad subject, one subject with no public profile.
        assert_eq!(batch.profiles.len(), 1);
        assert_eq!(batch.parse_failures, 2);
        assert_eq!(batch.profiles[0].profile_id, "a");
    }

    #[tokio::test]
    async fn test_fetch_page_empty_feed() {
        setup_logger();
        let mut server = Server::new_async().await;

        let _recs = server
            .mock("POST", "/rec/v2")
            .with_status(200)
            .with_body(r#"{"feeds": []}"#)
            .create_async()
            .await;

        let service = create_service(&server);
        let batch = service.fetch_page(&create_credential()).await.unwrap();

        assert!(batch.profiles.is_empty());
        assert_eq!(batch.parse_failures, 0);
    }

    #[tokio::test]
    async fn test_fetch_page_propagates_auth_rejection() {
        setup_logger();
        let mut server = Server::new_async().await;

        let _recs = server
            .mock("POST", "/rec/v2")
            .with_status(401)
            .with_body("{}")
            .create_async()
            .await;

        let service = create_service(&server);
        let result = service.fetch_page(&create_credential()).await;

        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_like_profile_posts_rating() {
        setup_logger();
        let mut server = Server::new_async().await;

        let rate_mock = server
            .mock("POST", "/rate/v2/initiate")
            .match_body(Matcher::PartialJson(json!({
                "subjectId": "a",
                "ratingToken": "ta",
                "sessionId": "sess-1",
                "rating": "note",
                "content": {"comment": "hello"}
            })))
            .with_status(200)
            .create_async()
            .await;

        let service = create_service(&server);
        let profile = Profile {
            profile_id: "a".to_string(),
            interaction: crate::application::models::profile::InteractionData {
                subject_id: "a".to_string(),
                rating_token: "ta".to_string(),
            },
            info: Default::default(),
            images: Vec::new(),
        };

        service
            .like_profile(&create_credential(), &profile, Some("hello"))
            .await
            .unwrap();
        rate_mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_send_message_posts_payload() {
        setup_logger();
        let mut server = Server::new_async().await;

        let message_mock = server
            .mock("POST", "/message/send")
            .match_body(Matcher::PartialJson(json!({
                "subjectId": "a",
                "messageData": {"message": "hi"},
                "messageType": "message"
            })))
            .with_status(200)
            .create_async()
            .await;

        let service = create_service(&server);
        service
            .send_message(&create_credential(), "a", "hi")
            .await
            .unwrap();
        message_mock.assert_async().await;
    }
}

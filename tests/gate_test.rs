//! Authorization Gate Integration Tests
//!
//! The gate must fail closed: any token, claim, or lookup problem collapses
//! to a single opaque rejection, and the identity lookup is never reached
//! with an unvalidated credential.

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use jsonwebtoken::Algorithm;
    use mockall::mock;
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::time::Duration;
    use tokengate::gate::{AuthGate, GateRequest, Outcome, PrincipalResolver, ResolveError};
    use tokengate::token::{AlgorithmFamily, AllowedFamilies, ClaimsProvider, TokenService};

    // ========================================================================
    // Helpers
    // ========================================================================

    #[derive(Debug, Clone, PartialEq)]
    struct TestUser {
        username: String,
    }

    mock! {
        Users {}

        #[async_trait]
        impl PrincipalResolver for Users {
            type Principal = TestUser;

            async fn resolve(&self, identity: &str) -> Result<TestUser, ResolveError>;
        }
    }

    /// Resolver that always outlives the gate's patience.
    struct SlowResolver;

    #[async_trait]
    impl PrincipalResolver for SlowResolver {
        type Principal = TestUser;

        async fn resolve(&self, identity: &str) -> Result<TestUser, ResolveError> {
            tokio::time::sleep(Duration::from_millis(500)).await;
            Ok(TestUser {
                username: identity.to_string(),
            })
        }
    }

    struct MapClaims(HashMap<String, Value>);

    impl ClaimsProvider for MapClaims {
        fn claims(&self) -> HashMap<String, Value> {
            self.0.clone()
        }
    }

    fn service() -> Arc<TokenService> {
        Arc::new(
            TokenService::hmac(
                Algorithm::HS256,
                b"signing-key",
                AllowedFamilies::only(AlgorithmFamily::Hmac),
            )
            .unwrap(),
        )
    }

    fn issue(service: &TokenService, claims: HashMap<String, Value>) -> String {
        service
            .issue(&MapClaims(claims), Duration::from_secs(30))
            .unwrap()
    }

    fn request(authorization: Option<String>) -> GateRequest {
        let mut headers = HashMap::new();
        if let Some(value) = authorization {
            headers.insert("authorization".to_string(), value);
        }
        GateRequest {
            headers,
            method: "GET".into(),
            path: "/events".into(),
        }
    }

    fn admin_resolver() -> MockUsers {
        let mut resolver = MockUsers::new();
        resolver
            .expect_resolve()
            .withf(|identity| identity == "admin")
            .returning(|identity| {
                Ok(TestUser {
                    username: identity.to_string(),
                })
            });
        resolver
    }

    const TIMEOUT: Duration = Duration::from_millis(50);

    // ========================================================================
    // TEST: Admission
    // ========================================================================

    #[tokio::test]
    async fn test_valid_token_admitted() {
        let service = service();
        let token = issue(&service, HashMap::from([("username".into(), json!("admin"))]));
        let gate = AuthGate::new(service, admin_resolver(), TIMEOUT);

        let outcome = gate.authorize(&request(Some(format!("Bearer {}", token)))).await;

        match outcome {
            Outcome::Admitted { principal, claims } => {
                assert_eq!(principal.username, "admin");
                assert_eq!(claims.get("username"), Some(&json!("admin")));
                assert!(claims.contains_key("exp"));
            }
            Outcome::Rejected => panic!("valid token should be admitted"),
        }
    }

    #[tokio::test]
    async fn test_bearer_prefix_is_optional() {
        let service = service();
        let token = issue(&service, HashMap::from([("username".into(), json!("admin"))]));
        let gate = AuthGate::new(service, admin_resolver(), TIMEOUT);

        let outcome = gate.authorize(&request(Some(token))).await;
        assert!(outcome.is_admitted());
    }

    #[tokio::test]
    async fn test_custom_identity_claim() {
        let service = service();
        let token = issue(&service, HashMap::from([("sub".into(), json!("admin"))]));
        let gate = AuthGate::new(service, admin_resolver(), TIMEOUT).with_identity_claim("sub");

        let outcome = gate.authorize(&request(Some(format!("Bearer {}", token)))).await;
        assert!(outcome.is_admitted());
    }

    // ========================================================================
    // TEST: Fail closed
    // ========================================================================

    // An unexpected resolver call panics the mock, so these tests also prove
    // the lookup is never reached with a bad credential.

    #[tokio::test]
    async fn test_missing_header_rejected() {
        let gate = AuthGate::new(service(), MockUsers::new(), TIMEOUT);

        let outcome = gate.authorize(&request(None)).await;
        assert!(!outcome.is_admitted());
    }

    #[tokio::test]
    async fn test_garbage_token_rejected() {
        let gate = AuthGate::new(service(), MockUsers::new(), TIMEOUT);

        let outcome = gate
            .authorize(&request(Some("Bearer not-a-jwt".into())))
            .await;
        assert!(!outcome.is_admitted());
    }

    #[tokio::test]
    async fn test_token_from_other_key_rejected() {
        let other = TokenService::hmac(
            Algorithm::HS256,
            b"other-key",
            AllowedFamilies::only(AlgorithmFamily::Hmac),
        )
        .unwrap();
        let token = issue(&other, HashMap::from([("username".into(), json!("admin"))]));

        let gate = AuthGate::new(service(), MockUsers::new(), TIMEOUT);
        let outcome = gate.authorize(&request(Some(format!("Bearer {}", token)))).await;
        assert!(!outcome.is_admitted());
    }

    #[tokio::test]
    async fn test_missing_identity_claim_rejected() {
        let service = service();
        // Correctly signed and unexpired, but carries no username
        let token = issue(&service, HashMap::from([("name".into(), json!("Admin"))]));

        let gate = AuthGate::new(service, MockUsers::new(), TIMEOUT);
        let outcome = gate.authorize(&request(Some(format!("Bearer {}", token)))).await;
        assert!(!outcome.is_admitted());
    }

    #[tokio::test]
    async fn test_non_string_identity_claim_rejected() {
        let service = service();
        let token = issue(&service, HashMap::from([("username".into(), json!(42))]));

        let gate = AuthGate::new(service, MockUsers::new(), TIMEOUT);
        let outcome = gate.authorize(&request(Some(format!("Bearer {}", token)))).await;
        assert!(!outcome.is_admitted());
    }

    #[tokio::test]
    async fn test_unknown_principal_rejected() {
        let service = service();
        let token = issue(&service, HashMap::from([("username".into(), json!("ghost"))]));

        let mut resolver = MockUsers::new();
        resolver
            .expect_resolve()
            .returning(|_| Err(ResolveError::NotFound));

        let gate = AuthGate::new(service, resolver, TIMEOUT);
        let outcome = gate.authorize(&request(Some(format!("Bearer {}", token)))).await;
        assert!(!outcome.is_admitted());
    }

    #[tokio::test]
    async fn test_lookup_backend_failure_rejected() {
        let service = service();
        let token = issue(&service, HashMap::from([("username".into(), json!("admin"))]));

        let mut resolver = MockUsers::new();
        resolver
            .expect_resolve()
            .returning(|_| Err(ResolveError::Unavailable("connection refused".into())));

        let gate = AuthGate::new(service, resolver, TIMEOUT);
        let outcome = gate.authorize(&request(Some(format!("Bearer {}", token)))).await;
        assert!(!outcome.is_admitted());
    }

    #[tokio::test]
    async fn test_slow_lookup_times_out_and_rejects() {
        let service = service();
        let token = issue(&service, HashMap::from([("username".into(), json!("admin"))]));

        let gate = AuthGate::new(service, SlowResolver, TIMEOUT);
        let outcome = gate.authorize(&request(Some(format!("Bearer {}", token)))).await;
        assert!(!outcome.is_admitted());
    }
}

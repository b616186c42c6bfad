    use super::*;
    use serde_json::json;
    use wiremock::matchers::{bearer_token, method, path, query_param};
    use wiremock::{Mock, MockServer, Request, ResponseTemplate};

    fn fields(pairs: &[(&str, serde_json::Value)]) -> Fields {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[tokio::test]
    async fn create_record_posts_fields_and_stamps_created_at() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/tables/workflows/records"))
            .and(bearer_token("secret"))
            .respond_with(|req: &Request| {
                let body: serde_json::Value = serde_json::from_slice(&req.body).unwrap();
                assert_eq!(body["fields"]["topic"], "Rust async");
                assert!(body["fields"]["created_at"].is_string());
                ResponseTemplate::new(200).set_body_json(json!({
                    "record": { "record_id": "rec_1", "fields": body["fields"] }
                }))
            })
            .expect(1)
            .mount(&server)
            .await;

        let store = HttpRecordStore::new(server.uri(), "secret", "workflows");
        let record = store
            .create_record(fields(&[("topic", json!("Rust async"))]))
            .await
            .unwrap();

        assert_eq!(record.record_id, "rec_1");
        assert_eq!(record.fields["topic"], "Rust async");
    }

    #[tokio::test]
    async fn update_record_patches_by_id() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/tables/workflows/records/rec_9"))
            .respond_with(|req: &Request| {
                let body: serde_json::Value = serde_json::from_slice(&req.body).unwrap();
                assert_eq!(body["fields"]["progress"], 50);
                assert!(body["fields"]["updated_at"].is_string());
                ResponseTemplate::new(200).set_body_json(json!({
                    "record": { "record_id": "rec_9", "fields": body["fields"] }
                }))
            })
            .expect(1)
            .mount(&server)
            .await;

        let store = HttpRecordStore::new(server.uri(), "secret", "workflows");
        let record = store
            .update_record("rec_9", fields(&[("progress", json!(50))]))
            .await
            .unwrap();

        assert_eq!(record.record_id, "rec_9");
        assert_eq!(record.fields["progress"], 50);
    }

    #[tokio::test]
    async fn query_records_sends_filter() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/tables/workflows/records/search"))
            .respond_with(|req: &Request| {
                let body: serde_json::Value = serde_json::from_slice(&req.body).unwrap();
                assert_eq!(body["filter"]["field"], "workflow_id");
                assert_eq!(body["filter"]["value"], "wf_abc");
                ResponseTemplate::new(200).set_body_json(json!({
                    "items": [
                        { "record_id": "rec_1", "fields": { "workflow_id": "wf_abc" } }
                    ],
                    "has_more": false,
                    "page_token": null
                }))
            })
            .expect(1)
            .mount(&server)
            .await;

        let store = HttpRecordStore::new(server.uri(), "secret", "workflows");
        let page = store
            .query_records(&RecordFilter::workflow_id("wf_abc"))
            .await
            .unwrap();

        assert_eq!(page.items.len(), 1);
        assert!(!page.has_more);
        assert_eq!(page.items[0].fields["workflow_id"], "wf_abc");
    }

    #[tokio::test]
    async fn list_records_passes_paging_params() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tables/workflows/records"))
            .and(query_param("page_size", "10"))
            .and(query_param("page_token", "20"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [],
                "has_more": false,
                "page_token": null
            })))
            .expect(1)
            .mount(&server)
            .await;

        let store = HttpRecordStore::new(server.uri(), "secret", "workflows");
        let options = ListOptions {
            page_size: Some(10),
            page_token: Some("20".to_string()),
        };
        let page = store.list_records(&options).await.unwrap();
        assert!(page.items.is_empty());
    }

    #[tokio::test]
    async fn api_error_message_is_extracted_from_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/tables/workflows/records"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "error": { "message": "token expired" }
            })))
            .mount(&server)
            .await;

        let store = HttpRecordStore::new(server.uri(), "secret", "workflows");
        let err = store.create_record(Fields::new()).await.unwrap_err();

        match err {
            StoreError::Api { status, message } => {
                assert_eq!(status, 403);
                assert_eq!(message, "token expired");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn plain_text_error_body_is_kept_verbatim() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tables"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let store = HttpRecordStore::new(server.uri(), "secret", "workflows");
        let err = store.list_tables().await.unwrap_err();

        match err {
            StoreError::Api { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "boom");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn create_table_returns_new_table_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/tables"))
            .respond_with(|req: &Request| {
                let body: serde_json::Value = serde_json::from_slice(&req.body).unwrap();
                assert_eq!(body["name"], "workflows");
                assert_eq!(body["fields"][0]["name"], "workflow_id");
                assert_eq!(body["fields"][0]["type"], "text");
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "table_id": "tbl_new" }))
            })
            .expect(1)
            .mount(&server)
            .await;

        let store = HttpRecordStore::new(server.uri(), "secret", "workflows");
        let schema = vec![FieldSchema::new("workflow_id", crate::record::FieldType::Text)];
        let table_id = store.create_table("workflows", &schema).await.unwrap();
        assert_eq!(table_id, "tbl_new");
    }

    #[tokio::test]
    async fn list_tables_decodes_items() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tables"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [
                    { "table_id": "tbl_1", "name": "workflows" },
                    { "table_id": "tbl_2", "name": "drafts" }
                ]
            })))
            .mount(&server)
            .await;

        let store = HttpRecordStore::new(server.uri(), "secret", "workflows");
        let tables = store.list_tables().await.unwrap();
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].name, "workflows");
    }

//! tests/api_tests.rs
//! Flujo completo a través de los endpoints HTTP.

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use actix_web::{http::StatusCode, test, web, App};
    use mockito::{Server, ServerGuard};
    use serde_json::{json, Value};

    use crate::app;
    use crate::services::studio_service::StudioService;
    use crate::tests::mock_hf::{
        complete_stream, mock_classifier, mock_file, mock_gradio_job, mock_gradio_upload,
    };
    use crate::tests::support::{png_bytes, studio_for};

    const TEE_LABELS: &str = r#"[{"label": "jersey, T-shirt, tee shirt", "score": 0.91},
                                 {"label": "sweatshirt", "score": 0.05}]"#;

    macro_rules! studio_app {
        ($studio:expr) => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new($studio))
                    .configure(app::init_app),
            )
            .await
        };
    }

    fn upload_body(file_name: &str) -> Value {
        json!({
            "file_name": file_name,
            "data": format!("data:image/png;base64,{}", base64::encode(png_bytes(64, 48)))
        })
    }

    async fn mock_preview_space(server: &mut ServerGuard) {
        let gallery = json!([[{
            "image": {"path": "/tmp/gradio/preview.png", "url": format!("{}/files/preview.png", server.url())},
            "caption": null
        }]]);
        mock_gradio_job(server, "/preview", "infer", "ev-preview", complete_stream(&gallery)).await;
        mock_file(server, "/files/preview.png", png_bytes(32, 48)).await;
    }

    async fn mock_tryon_space(server: &mut ServerGuard) {
        mock_gradio_upload(server, "/tryon-space", "/tmp/gradio/upload.png").await;
        let outputs = json!([
            {"path": "/tmp/gradio/final.png", "url": format!("{}/files/final.png", server.url())},
            {"path": "/tmp/gradio/mask.png"}
        ]);
        mock_gradio_job(server, "/tryon-space", "tryon", "ev-tryon", complete_stream(&outputs)).await;
        mock_file(server, "/files/final.png", png_bytes(40, 60)).await;
    }

    async fn studio(server: &ServerGuard, dir: &tempfile::TempDir) -> StudioService {
        studio_for(&server.url(), dir.path()).await
    }

    #[actix_rt::test]
    async fn full_flow_from_upload_to_final_image() {
        let mut server = Server::new_async().await;
        mock_classifier(&mut server, 200, TEE_LABELS).await;
        mock_preview_space(&mut server).await;
        mock_tryon_space(&mut server).await;

        let dir = tempfile::tempdir().unwrap();
        let app = studio_app!(studio(&server, &dir).await);

        // 1) upload
        let req = test::TestRequest::post()
            .uri("/api/sessions")
            .set_json(upload_body("Product.PNG"))
            .to_request();
        let view: Value = test::call_and_read_body_json(&app, req).await;
        let id = view["id"].as_str().unwrap().to_string();
        assert_eq!(view["detected_category"], "upper_body");
        assert_eq!(view["chosen_category"], "upper_body");
        assert_eq!(view["tags"], json!(["jersey", "t-shirt", "tee shirt", "sweatshirt"]));
        assert_eq!(view["tryon_supported"], true);
        assert!(view.get("warning").is_none());

        // 2) previews
        let req = test::TestRequest::post()
            .uri(&format!("/api/sessions/{}/previews", id))
            .set_json(json!({"num_options": 3}))
            .to_request();
        let view: Value = test::call_and_read_body_json(&app, req).await;
        let previews = view["previews"].as_array().unwrap();
        assert_eq!(previews.len(), 3);
        assert_eq!(
            previews[0],
            format!("/api/sessions/{}/images/base_model_0.png", id)
        );
        assert!(view["selected_preview"].is_null());

        // 3) selección; el índice == cantidad de previews queda fuera de rango
        let req = test::TestRequest::post()
            .uri(&format!("/api/sessions/{}/selection", id))
            .set_json(json!({"index": 3}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::post()
            .uri(&format!("/api/sessions/{}/selection", id))
            .set_json(json!({"index": 1}))
            .to_request();
        let view: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(view["selected_preview"], 1);

        // 4) try-on
        let req = test::TestRequest::post()
            .uri(&format!("/api/sessions/{}/tryon", id))
            .set_json(json!({}))
            .to_request();
        let view: Value = test::call_and_read_body_json(&app, req).await;
        let final_url = view["final_image"].as_str().unwrap().to_string();
        assert_eq!(
            final_url,
            format!("/api/sessions/{}/images/final_tryon.png", id)
        );

        // 5) la imagen final se sirve tal cual la devolvió el Space
        let req = test::TestRequest::get().uri(&final_url).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = test::read_body(resp).await;
        assert_eq!(body.as_ref(), png_bytes(40, 60).as_slice());

        // 6) ambas operaciones quedaron registradas como "done"
        let req = test::TestRequest::get().uri("/api/operations").to_request();
        let ops: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(ops["total"], 2);
        for op in ops["items"].as_array().unwrap() {
            assert_eq!(op["status"], "done");
            assert_eq!(op["is_async"], false);
        }
    }

    #[actix_rt::test]
    async fn footwear_gets_a_warning_and_tryon_is_rejected() {
        let mut server = Server::new_async().await;
        mock_classifier(&mut server, 200, r#"[{"label": "clog, geta, patten, sabot"}]"#).await;
        mock_preview_space(&mut server).await;

        let dir = tempfile::tempdir().unwrap();
        let app = studio_app!(studio(&server, &dir).await);

        let req = test::TestRequest::post()
            .uri("/api/sessions")
            .set_json(upload_body("clogs.png"))
            .to_request();
        let view: Value = test::call_and_read_body_json(&app, req).await;
        let id = view["id"].as_str().unwrap().to_string();
        assert_eq!(view["chosen_category"], "footwear");
        assert_eq!(view["tryon_supported"], false);
        assert!(view["warning"].as_str().unwrap().contains("footwear"));

        // las previews siguen disponibles
        let req = test::TestRequest::post()
            .uri(&format!("/api/sessions/{}/previews", id))
            .set_json(json!({"num_options": 1}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let req = test::TestRequest::post()
            .uri(&format!("/api/sessions/{}/selection", id))
            .set_json(json!({"index": 0}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

        let req = test::TestRequest::post()
            .uri(&format!("/api/sessions/{}/tryon", id))
            .set_json(json!({}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], false);

        // sin operación creada para un try-on rechazado
        let req = test::TestRequest::get().uri("/api/operations").to_request();
        let ops: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(ops["total"], 1);
    }

    #[actix_rt::test]
    async fn classifier_outage_still_creates_a_session() {
        let mut server = Server::new_async().await;
        mock_classifier(&mut server, 503, r#"{"error": "Model is currently loading"}"#).await;

        let dir = tempfile::tempdir().unwrap();
        let app = studio_app!(studio(&server, &dir).await);

        let req = test::TestRequest::post()
            .uri("/api/sessions")
            .set_json(upload_body("shirt.jpg"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let view: Value = test::read_body_json(resp).await;
        assert_eq!(view["tags"], json!([]));
        assert_eq!(view["display_tags"], json!([]));
        assert_eq!(view["detected_category"], "upper_body");
        assert!(view["product_image"].as_str().unwrap().ends_with("/images/product.jpg"));
    }

    #[actix_rt::test]
    async fn invalid_uploads_are_rejected() {
        let server = Server::new_async().await;
        let dir = tempfile::tempdir().unwrap();
        let app = studio_app!(studio(&server, &dir).await);

        let req = test::TestRequest::post()
            .uri("/api/sessions")
            .set_json(upload_body("animation.gif"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert!(body["error"].as_str().unwrap().contains("PNG or JPG"));

        let req = test::TestRequest::post()
            .uri("/api/sessions")
            .set_json(json!({"file_name": "shirt.png", "data": "%%% not base64 %%%"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::post()
            .uri("/api/sessions")
            .set_json(json!({"file_name": "shirt.png", "data": ""}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::get().uri("/api/sessions").to_request();
        let list: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(list["total"], 0);
    }

    #[actix_rt::test]
    async fn validation_errors_map_to_status_codes() {
        let mut server = Server::new_async().await;
        mock_classifier(&mut server, 200, TEE_LABELS).await;

        let dir = tempfile::tempdir().unwrap();
        let app = studio_app!(studio(&server, &dir).await);

        let req = test::TestRequest::post()
            .uri("/api/sessions")
            .set_json(upload_body("tee.png"))
            .to_request();
        let view: Value = test::call_and_read_body_json(&app, req).await;
        let id = view["id"].as_str().unwrap().to_string();

        let cases = [
            (
                test::TestRequest::post()
                    .uri(&format!("/api/sessions/{}/previews", id))
                    .set_json(json!({"num_options": 0})),
                StatusCode::BAD_REQUEST,
            ),
            (
                test::TestRequest::post()
                    .uri(&format!("/api/sessions/{}/previews", id))
                    .set_json(json!({"num_options": 7})),
                StatusCode::BAD_REQUEST,
            ),
            (
                test::TestRequest::post()
                    .uri("/api/sessions/does-not-exist/previews")
                    .set_json(json!({})),
                StatusCode::NOT_FOUND,
            ),
            (
                test::TestRequest::get().uri("/api/sessions/does-not-exist"),
                StatusCode::NOT_FOUND,
            ),
            (
                test::TestRequest::post()
                    .uri(&format!("/api/sessions/{}/selection", id))
                    .set_json(json!({"index": 0})),
                StatusCode::BAD_REQUEST,
            ),
            (
                // sin preview elegida
                test::TestRequest::post()
                    .uri(&format!("/api/sessions/{}/tryon", id))
                    .set_json(json!({})),
                StatusCode::BAD_REQUEST,
            ),
            (
                test::TestRequest::put()
                    .uri(&format!("/api/sessions/{}/category", id))
                    .set_json(json!({"category": "hats"})),
                StatusCode::BAD_REQUEST,
            ),
            (
                test::TestRequest::get()
                    .uri(&format!("/api/sessions/{}/images/studio.db", id)),
                StatusCode::NOT_FOUND,
            ),
            (
                test::TestRequest::get().uri("/api/operations/does-not-exist"),
                StatusCode::NOT_FOUND,
            ),
        ];

        for (req, expected) in cases {
            let resp = test::call_service(&app, req.to_request()).await;
            assert_eq!(resp.status(), expected);
        }

        // ninguna validación fallida dejó operaciones huérfanas
        let req = test::TestRequest::get().uri("/api/operations").to_request();
        let ops: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(ops["total"], 0);
    }

    #[actix_rt::test]
    async fn category_override_is_persisted() {
        let mut server = Server::new_async().await;
        mock_classifier(&mut server, 200, TEE_LABELS).await;

        let dir = tempfile::tempdir().unwrap();
        let app = studio_app!(studio(&server, &dir).await);

        let req = test::TestRequest::post()
            .uri("/api/sessions")
            .set_json(upload_body("tee.png"))
            .to_request();
        let view: Value = test::call_and_read_body_json(&app, req).await;
        let id = view["id"].as_str().unwrap().to_string();

        let req = test::TestRequest::put()
            .uri(&format!("/api/sessions/{}/category", id))
            .set_json(json!({"category": "Dresses"}))
            .to_request();
        let view: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(view["chosen_category"], "dresses");
        assert_eq!(view["detected_category"], "upper_body");

        let req = test::TestRequest::get()
            .uri(&format!("/api/sessions/{}", id))
            .to_request();
        let view: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(view["chosen_category"], "dresses");
        assert_eq!(view["categories"].as_array().unwrap().len(), 5);

        let req = test::TestRequest::get()
            .uri(&format!("/api/sessions/{}/images/product.png", id))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = test::read_body(resp).await;
        assert_eq!(body.as_ref(), png_bytes(64, 48).as_slice());
    }

    #[actix_rt::test]
    async fn async_previews_are_queued_and_tracked() {
        let mut server = Server::new_async().await;
        mock_classifier(&mut server, 200, TEE_LABELS).await;
        mock_preview_space(&mut server).await;

        let dir = tempfile::tempdir().unwrap();
        let app = studio_app!(studio(&server, &dir).await);

        let req = test::TestRequest::post()
            .uri("/api/sessions")
            .set_json(upload_body("tee.png"))
            .to_request();
        let view: Value = test::call_and_read_body_json(&app, req).await;
        let id = view["id"].as_str().unwrap().to_string();

        let req = test::TestRequest::post()
            .uri(&format!("/api/sessions/{}/previews", id))
            .set_json(json!({"num_options": 2, "gender": "female", "async_run": true}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::ACCEPTED);
        let queued: Value = test::read_body_json(resp).await;
        let op_id = queued["operation_id"].as_str().unwrap().to_string();

        let mut status = String::new();
        for _ in 0..100 {
            let req = test::TestRequest::get()
                .uri(&format!("/api/operations/{}", op_id))
                .to_request();
            let op: Value = test::call_and_read_body_json(&app, req).await;
            status = op["status"].as_str().unwrap().to_string();
            if status != "running" {
                assert_eq!(op["is_async"], true);
                break;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        assert_eq!(status, "done");

        let req = test::TestRequest::get()
            .uri(&format!("/api/sessions/{}", id))
            .to_request();
        let view: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(view["previews"].as_array().unwrap().len(), 2);
    }

    #[actix_rt::test]
    async fn failed_previews_mark_the_operation_failed() {
        let mut server = Server::new_async().await;
        mock_classifier(&mut server, 200, TEE_LABELS).await;
        let stream = "event: error\ndata: \"GPU quota exceeded\"\n\n".to_string();
        mock_gradio_job(&mut server, "/preview", "infer", "ev-fail", stream).await;

        let dir = tempfile::tempdir().unwrap();
        let app = studio_app!(studio(&server, &dir).await);

        let req = test::TestRequest::post()
            .uri("/api/sessions")
            .set_json(upload_body("tee.png"))
            .to_request();
        let view: Value = test::call_and_read_body_json(&app, req).await;
        let id = view["id"].as_str().unwrap().to_string();

        let req = test::TestRequest::post()
            .uri(&format!("/api/sessions/{}/previews", id))
            .set_json(json!({"num_options": 2}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);

        let req = test::TestRequest::get().uri("/api/operations").to_request();
        let ops: Value = test::call_and_read_body_json(&app, req).await;
        let op = &ops["items"][0];
        assert_eq!(op["status"], "failed");
        assert!(op["error_message"].as_str().unwrap().contains("no model previews"));
    }

    #[actix_rt::test]
    async fn health_and_index_are_served() {
        let server = Server::new_async().await;
        let dir = tempfile::tempdir().unwrap();
        let app = studio_app!(studio(&server, &dir).await);

        let req = test::TestRequest::get().uri("/api/health").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], "ok");

        let req = test::TestRequest::get().uri("/").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let html = test::read_body(resp).await;
        assert!(String::from_utf8_lossy(&html).contains("SellerStudio"));
    }
}

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use jsonwebtoken::{encode, EncodingKey, Header};
use rust_decimal::Decimal;
use serde_json::{json, Value};

use banking_client::auth::{MemoryTokenStore, TokenProvider};
use banking_client::backend::{BankingBackend, HttpBankingBackend};
use banking_client::client::ClientConfig;
use banking_client::clock::ManualClock;
use banking_client::error::BankingError;
use banking_client::models::{AccountId, MoneyTransferRequest, TransferId, TransferStatus};
use banking_client::user_service::UserService;
use banking_client::verification::{CodeTracker, ConfirmationPoller, PollerConfig};

#[derive(Debug, Clone)]
struct Hit {
    path: String,
    auth: Option<String>,
    body: Value,
}

type Hits = Arc<Mutex<Vec<Hit>>>;

fn record(hits: &Hits, path: String, headers: &HeaderMap, body: Value) {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    hits.lock().unwrap().push(Hit { path, auth, body });
}

fn user_token(user_id: u64) -> String {
    encode(
        &Header::default(),
        &json!({ "id": user_id, "exp": 4_102_444_800u64 }),
        &EncodingKey::from_secret(b"backend-secret"),
    )
    .unwrap()
}

fn bank_router(hits: Hits) -> Router {
    Router::new()
        .route(
            "/money-transfer",
            post(|State(hits): State<Hits>, headers: HeaderMap, Json(body): Json<Value>| async move {
                record(&hits, "/money-transfer".into(), &headers, body);
                Json(json!({ "transferId": "42" }))
            }),
        )
        .route(
            "/mobile-transfers",
            get(|State(hits): State<Hits>, headers: HeaderMap| async move {
                record(&hits, "/mobile-transfers".into(), &headers, Value::Null);
                Json(json!({
                    "success": true,
                    "data": { "transfers": [
                        {
                            "id": 42,
                            "amount": 1500.5,
                            "fromAccountId": { "id": 1, "accountNumber": "265-11", "ownerID": 7 },
                            "toAccountId": { "id": "2", "accountNumber": "265-22", "ownerID": "8" },
                            "receiver": "Petar",
                            "adress": "Bulevar 1",
                            "paymentDescription": "Rent",
                            "fromCurrency": { "code": "RSD" },
                            "createdAt": 1700000000000i64,
                            "otp": "123456",
                            "type": "EXTERNAL",
                            "status": "PENDING"
                        },
                        { "id": "43", "status": "COMPLETED", "createdAt": "not a date" }
                    ]}
                }))
            }),
        )
        .route(
            "/otp/verification",
            post(|State(hits): State<Hits>, headers: HeaderMap, Json(body): Json<Value>| async move {
                let ok = body["otpCode"] == "123456";
                record(&hits, "/otp/verification".into(), &headers, body);
                if ok {
                    (StatusCode::OK, Json(json!({ "success": true })))
                } else {
                    (
                        StatusCode::BAD_REQUEST,
                        Json(json!({ "success": false, "message": "Invalid OTP" })),
                    )
                }
            }),
        )
        .route(
            "/accounts/user/:id",
            get(|State(hits): State<Hits>, Path(id): Path<String>, headers: HeaderMap| async move {
                record(&hits, format!("/accounts/user/{}", id), &headers, Value::Null);
                if id == "7" {
                    Json(json!({ "success": true, "data": { "accounts": [
                        { "id": 1, "subtype": "CURRENT", "accountNumber": "265000000011114321",
                          "balance": 1200.5, "currencyType": "RSD" }
                    ]}}))
                } else {
                    Json(json!({ "success": true, "data": { "accounts": "none" } }))
                }
            }),
        )
        .route(
            "/transactions/:id",
            get(|State(hits): State<Hits>, Path(id): Path<String>, headers: HeaderMap| async move {
                record(&hits, format!("/transactions/{}", id), &headers, Value::Null);
                Json(json!({ "success": true, "data": { "data": [
                    { "toAccountId": { "id": 1, "accountNumber": "265-11" },
                      "amount": 10, "currency": { "code": "RSD" }, "timestamp": 5 }
                ]}}))
            }),
        )
        .route(
            "/api/auth/login",
            post(|State(hits): State<Hits>, headers: HeaderMap, Json(body): Json<Value>| async move {
                let ok = body["password"] == "secret";
                record(&hits, "/api/auth/login".into(), &headers, body);
                if ok {
                    (
                        StatusCode::OK,
                        Json(json!({ "success": true, "data": { "token": user_token(7) } })),
                    )
                } else {
                    (
                        StatusCode::UNAUTHORIZED,
                        Json(json!({ "success": false, "message": "Bad credentials" })),
                    )
                }
            }),
        )
        .route(
            "/api/customer/:id",
            get(|State(hits): State<Hits>, Path(id): Path<String>, headers: HeaderMap| async move {
                record(&hits, format!("/api/customer/{}", id), &headers, Value::Null);
                Json(json!({ "success": true, "data": { "id": id, "firstName": "Ana", "lastName": "Jovic" } }))
            }),
        )
        .with_state(hits)
}

async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

async fn start() -> (String, Hits) {
    let hits: Hits = Arc::new(Mutex::new(Vec::new()));
    let url = serve(bank_router(hits.clone())).await;
    (url, hits)
}

fn backend(url: &str, token: Option<&str>) -> HttpBankingBackend {
    let store: Arc<dyn TokenProvider> = match token {
        Some(token) => Arc::new(MemoryTokenStore::with_token(token)),
        None => Arc::new(MemoryTokenStore::new()),
    };
    HttpBankingBackend::new(&ClientConfig::new(url), store).unwrap()
}

fn request() -> MoneyTransferRequest {
    MoneyTransferRequest {
        from_account_number: "265-11".to_string(),
        receiver: "Petar".to_string(),
        recipient_account: "265-22".to_string(),
        payment_code: "289".to_string(),
        payment_reference: String::new(),
        payment_description: "Rent".to_string(),
        amount: Decimal::new(15005, 1),
        address: "Bulevar 1".to_string(),
        saved_receiver: None,
    }
}

#[tokio::test]
async fn test_create_transfer_sends_wire_body_with_bearer() {
    let (url, hits) = start().await;
    let id = backend(&url, Some("tok")).create_transfer(&request()).await.unwrap();
    assert_eq!(id, TransferId::new(42));

    let hits = hits.lock().unwrap().clone();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].path, "/money-transfer");
    assert_eq!(hits[0].auth.as_deref(), Some("Bearer tok"));
    let body = &hits[0].body;
    assert_eq!(body["fromAccountNumber"], "265-11");
    assert_eq!(body["recipientAccount"], "265-22");
    assert_eq!(body["payementCode"], "289");
    assert_eq!(body["payementDescription"], "Rent");
    assert_eq!(body["adress"], "Bulevar 1");
    assert_eq!(body["amount"], 1500.5);
    assert!(body["savedReceiver"].is_null());
}

#[tokio::test]
async fn test_fetch_transfers_parses_envelope() {
    let (url, _hits) = start().await;
    let transfers = backend(&url, Some("tok")).fetch_transfers().await.unwrap();
    assert_eq!(transfers.len(), 2);

    let first = &transfers[0];
    assert_eq!(first.id, TransferId::new(42));
    assert_eq!(first.status, TransferStatus::Pending);
    assert_eq!(first.code(), Some("123456"));
    assert_eq!(first.address.as_deref(), Some("Bulevar 1"));
    assert_eq!(first.currency_code(), "RSD");
    let owner = first.to_account.as_ref().and_then(|a| a.owner_id.clone());
    assert_eq!(owner, Some(AccountId::from(8)));

    // malformed createdAt degrades to no timestamp
    assert_eq!(transfers[1].created_at, None);
}

#[tokio::test]
async fn test_verify_otp_body_and_failure() {
    let (url, hits) = start().await;
    let backend = backend(&url, Some("tok"));
    backend.verify_otp(TransferId::new(42), "123456").await.unwrap();

    let err = backend.verify_otp(TransferId::new(42), "000000").await.unwrap_err();
    assert!(matches!(err, BankingError::Status { status: 400, .. }));

    let hits = hits.lock().unwrap().clone();
    assert_eq!(hits[0].body, json!({ "transferId": 42, "otpCode": "123456" }));
}

#[tokio::test]
async fn test_no_token_sends_nothing() {
    let (url, hits) = start().await;
    let backend = backend(&url, None);
    assert_eq!(backend.fetch_transfers().await.unwrap_err(), BankingError::Unauthenticated);
    assert_eq!(
        backend.create_transfer(&request()).await.unwrap_err(),
        BankingError::Unauthenticated
    );
    assert!(hits.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_accounts_and_transactions() {
    let (url, hits) = start().await;
    let backend = backend(&url, Some("tok"));

    let accounts = backend.fetch_accounts(&AccountId::from(7)).await.unwrap();
    assert_eq!(accounts.len(), 1);
    assert_eq!(accounts[0].id, AccountId::new("1"));

    // non-array account list reads as empty
    assert!(backend.fetch_accounts(&AccountId::from(9)).await.unwrap().is_empty());

    let history = backend.fetch_transactions(&AccountId::from(1)).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].timestamp, Some(5));

    let paths: Vec<String> = hits.lock().unwrap().iter().map(|h| h.path.clone()).collect();
    assert_eq!(paths, vec!["/accounts/user/7", "/accounts/user/9", "/transactions/1"]);
}

#[tokio::test]
async fn test_request_timeout() {
    let router = Router::new().route(
        "/mobile-transfers",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(json!({ "success": true, "data": { "transfers": [] } }))
        }),
    );
    let url = serve(router).await;

    let tokens: Arc<dyn TokenProvider> = Arc::new(MemoryTokenStore::with_token("tok"));
    let config = ClientConfig::new(url).with_timeout(Duration::from_millis(200));
    let backend = HttpBankingBackend::new(&config, tokens).unwrap();

    let err = backend.fetch_transfers().await.unwrap_err();
    assert!(matches!(err, BankingError::Timeout(_)), "got {:?}", err);
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_login_stores_token_and_loads_viewer() {
    let (url, hits) = start().await;
    let store = Arc::new(MemoryTokenStore::new());
    let users = UserService::new(&ClientConfig::new(&url), store.clone()).unwrap();

    let err = users.login("ana@bank.rs", "wrong").await.unwrap_err();
    assert!(matches!(err, BankingError::Status { status: 401, .. }));
    assert!(store.token().is_none());

    let user_id = users.login("ana@bank.rs", "secret").await.unwrap();
    assert_eq!(user_id, AccountId::from(7));
    assert!(store.token().is_some());

    let viewer = users.viewer().await.unwrap();
    assert_eq!(viewer.full_name, "Ana Jovic");
    assert_eq!(viewer.user_id, AccountId::from(7));

    let hits = hits.lock().unwrap().clone();
    assert_eq!(hits[0].auth, None);
    assert_eq!(hits.last().unwrap().path, "/api/customer/7");
    assert!(hits.last().unwrap().auth.as_deref().unwrap().starts_with("Bearer "));
}

const LIST_OK: u8 = 0;
const LIST_UNSUCCESSFUL: u8 = 1;
const LIST_OUTAGE: u8 = 2;

fn switchable_router(mode: Arc<AtomicU8>) -> Router {
    Router::new().route(
        "/mobile-transfers",
        get(move || {
            let mode = mode.clone();
            async move {
                match mode.load(Ordering::SeqCst) {
                    LIST_OK => (
                        StatusCode::OK,
                        Json(json!({ "success": true, "data": { "transfers": [
                            { "id": 1, "status": "PENDING", "amount": 5, "createdAt": 1000 },
                            { "id": 2, "status": "COMPLETED", "amount": null }
                        ]}})),
                    ),
                    LIST_UNSUCCESSFUL => (
                        StatusCode::OK,
                        Json(json!({ "success": false, "message": "No transfers for user" })),
                    ),
                    _ => (
                        StatusCode::SERVICE_UNAVAILABLE,
                        Json(json!({ "success": false })),
                    ),
                }
            }
        }),
    )
}

#[tokio::test]
async fn test_unsuccessful_transfer_list_is_empty() {
    let mode = Arc::new(AtomicU8::new(LIST_UNSUCCESSFUL));
    let url = serve(switchable_router(mode)).await;

    let transfers = backend(&url, Some("tok")).fetch_transfers().await.unwrap();
    assert!(transfers.is_empty());
}

#[tokio::test]
async fn test_poller_empties_on_unsuccessful_list_but_keeps_on_outage() {
    let mode = Arc::new(AtomicU8::new(LIST_OK));
    let url = serve(switchable_router(mode.clone())).await;

    let poller = ConfirmationPoller::new(
        Arc::new(backend(&url, Some("tok"))),
        Arc::new(ManualClock::new(2000)),
        CodeTracker::default(),
        PollerConfig::default(),
    );

    assert!(poller.refresh().await);
    assert_eq!(poller.transfers().len(), 2);

    mode.store(LIST_OUTAGE, Ordering::SeqCst);
    assert!(!poller.refresh().await);
    assert_eq!(poller.transfers().len(), 2);

    mode.store(LIST_UNSUCCESSFUL, Ordering::SeqCst);
    assert!(poller.refresh().await);
    assert!(poller.transfers().is_empty());
    assert!(poller.snapshot().rows.is_empty());
}

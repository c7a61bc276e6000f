use coinledger_core::db::open_db_in_memory;
use coinledger_core::{
    AuthConfig, Authenticator, Claims, HistoryService, LedgerErrorKind, LedgerService,
    PasswordHashingConfig,
};
use jsonwebtoken::{encode, EncodingKey, Header};
use std::time::{SystemTime, UNIX_EPOCH};

const SECRET: &str = "test-signing-secret";

fn authenticator() -> Authenticator {
    let mut config = AuthConfig::new(SECRET);
    config.password_hashing = PasswordHashingConfig {
        memory_kib: 8,
        iterations: 1,
        parallelism: 1,
    };
    Authenticator::new(&config).unwrap()
}

#[test]
fn first_login_registers_account_with_initial_coins() {
    let conn = open_db_in_memory().unwrap();
    let auth = authenticator();

    let token = auth.authenticate(&conn, "alice", "pa55word").unwrap();
    let caller = auth.verify_token(&token.token).unwrap();
    assert_eq!(caller.account_id, token.account_id);
    assert_eq!(caller.username, "alice");

    let summary = HistoryService::new(&conn)
        .get_summary(caller.account_id)
        .unwrap();
    assert_eq!(summary.balance, 1000);

    let stored_hash: String = conn
        .query_row(
            "SELECT password_hash FROM accounts WHERE username = 'alice';",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert!(stored_hash.starts_with("$argon2id$"));
    assert!(!stored_hash.contains("pa55word"));
}

#[test]
fn repeat_login_returns_same_identity() {
    let conn = open_db_in_memory().unwrap();
    let auth = authenticator();

    let first = auth.authenticate(&conn, "alice", "pa55word").unwrap();
    let second = auth.authenticate(&conn, "alice", "pa55word").unwrap();
    assert_eq!(first.account_id, second.account_id);

    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM accounts;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 1);
}

#[test]
fn wrong_password_is_unauthorized() {
    let conn = open_db_in_memory().unwrap();
    let auth = authenticator();
    auth.authenticate(&conn, "alice", "pa55word").unwrap();

    let err = auth.authenticate(&conn, "alice", "guess").unwrap_err();
    assert_eq!(err.kind(), LedgerErrorKind::Unauthorized);
    assert_eq!(err.status_code(), 401);
}

#[test]
fn blank_or_malformed_credentials_are_invalid_input() {
    let conn = open_db_in_memory().unwrap();
    let auth = authenticator();

    for (username, password) in [("", "pw"), ("alice", ""), ("al ice", "pw")] {
        let err = auth.authenticate(&conn, username, password).unwrap_err();
        assert_eq!(err.kind(), LedgerErrorKind::InvalidInput, "{username:?}");
    }
}

#[test]
fn narrowed_usernames_never_register() {
    let conn = open_db_in_memory().unwrap();
    let auth = authenticator();
    let overlong = "x".repeat(65);

    for username in ["two words", " alice", "bob!", "semi;colon", overlong.as_str()] {
        let err = auth.authenticate(&conn, username, "pw").unwrap_err();
        assert_eq!(err.kind(), LedgerErrorKind::InvalidInput, "{username:?}");
    }
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM accounts;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 0);

    auth.authenticate(&conn, "bob.smith-2@corp", "pw").unwrap();
}

#[test]
fn tampered_or_expired_tokens_are_unauthorized() {
    let conn = open_db_in_memory().unwrap();
    let auth = authenticator();
    let token = auth.authenticate(&conn, "alice", "pa55word").unwrap();

    let mut tampered = token.token.clone();
    tampered.push('x');
    assert_eq!(
        auth.verify_token(&tampered).unwrap_err().kind(),
        LedgerErrorKind::Unauthorized
    );

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs();
    let expired = encode(
        &Header::default(),
        &Claims {
            sub: token.account_id.to_string(),
            username: "alice".to_string(),
            iat: now - 7200,
            exp: now - 3600,
        },
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap();
    assert_eq!(
        auth.verify_token(&expired).unwrap_err().kind(),
        LedgerErrorKind::Unauthorized
    );
}

#[test]
fn verified_caller_drives_ledger_operations() {
    let conn = open_db_in_memory().unwrap();
    let auth = authenticator();
    let alice = auth
        .verify_token(&auth.authenticate(&conn, "alice", "a").unwrap().token)
        .unwrap();
    let bob = auth
        .verify_token(&auth.authenticate(&conn, "bob", "b").unwrap().token)
        .unwrap();

    let ledger = LedgerService::new(&conn);
    ledger.transfer(alice.account_id, &bob.username, 250).unwrap();
    ledger.purchase(bob.account_id, "powerbank").unwrap();

    let history = HistoryService::new(&conn);
    assert_eq!(history.get_summary(alice.account_id).unwrap().balance, 750);
    assert_eq!(history.get_summary(bob.account_id).unwrap().balance, 1050);
}

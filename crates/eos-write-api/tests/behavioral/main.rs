//! Behavioral tests for the write API.
//!
//! These tests drive the public API end to end against an in-process chain
//! (a recording [`Network`] or a wiremock node) without requiring a live
//! network.

use async_trait::async_trait;
use eos_write_api::network::{Network, PushReceipt};
use eos_write_api::transaction::TransactionHeaders;
use eos_write_api::types::TimePointSec;
use eos_write_api::{
    CallArgs, LocalSigner, SignedTransaction, WriteApi, WriteApiConfig, WriteApiError,
    WriteApiResult,
};
use std::sync::{Arc, Mutex};

const CHAIN_ID: &str = "00000000000000000000000000000000000000000000000000000000000000aa";
const KEY: &str = "0303030303030303030303030303030303030303030303030303030303030303";

#[derive(Debug, Default)]
struct RecordingNetwork {
    reject: bool,
    pushed: Mutex<Vec<SignedTransaction>>,
}

impl RecordingNetwork {
    fn rejecting() -> Self {
        Self {
            reject: true,
            ..Self::default()
        }
    }

    fn pushed(&self) -> Vec<SignedTransaction> {
        self.pushed.lock().unwrap().clone()
    }
}

#[async_trait]
impl Network for RecordingNetwork {
    async fn create_transaction(
        &self,
        expire_in_seconds: u64,
    ) -> WriteApiResult<TransactionHeaders> {
        Ok(TransactionHeaders {
            ref_block_num: 1,
            ref_block_prefix: 2,
            expiration: TimePointSec::new(1_000).plus_seconds(expire_in_seconds),
        })
    }

    async fn push_transaction(
        &self,
        transaction: &SignedTransaction,
    ) -> WriteApiResult<PushReceipt> {
        if self.reject {
            return Err(WriteApiError::api(400, "transaction rejected"));
        }
        self.pushed.lock().unwrap().push(transaction.clone());
        Ok(PushReceipt::default())
    }
}

/// Routes pipeline logs to the test harness; set `RUST_LOG` to see them.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn signer() -> Arc<LocalSigner> {
    Arc::new(LocalSigner::from_hex_keys([KEY]).unwrap())
}

fn api_with(network: Arc<RecordingNetwork>, config: WriteApiConfig) -> WriteApi {
    init_tracing();
    WriteApi::builder(config)
        .with_network(network)
        .build()
        .unwrap()
}

fn signing_api() -> (WriteApi, Arc<RecordingNetwork>) {
    let network = Arc::new(RecordingNetwork::default());
    let config = WriteApiConfig::local()
        .with_chain_id(CHAIN_ID)
        .with_sign_provider(signer());
    (api_with(network.clone(), config), network)
}

fn transfer(from: &str, to: &str) -> CallArgs {
    CallArgs::new().arg(from).arg(to).arg("1.0000 EOS").arg("")
}

fn scope(signed: &SignedTransaction) -> Vec<String> {
    signed
        .transaction
        .scope
        .iter()
        .map(ToString::to_string)
        .collect()
}

mod action_tests {
    use super::*;
    use eos_write_api::CallSettings;
    use serde_json::json;

    #[tokio::test]
    async fn test_transfer_scope_and_signature() {
        let (api, network) = signing_api();
        let signed = api
            .action("transfer")
            .unwrap()
            .call(transfer("bob", "alice"))
            .unwrap()
            .await
            .unwrap();

        assert_eq!(scope(&signed), vec!["alice", "bob"]);
        assert_eq!(signed.signatures.len(), 1);
        assert_eq!(signed.signatures[0].len(), 130);
        assert_eq!(network.pushed().len(), 1);
    }

    #[tokio::test]
    async fn test_named_and_positional_calls_agree() {
        let (api, _) = signing_api();
        let transfer_method = api.action("transfer").unwrap();
        let positional = transfer_method
            .call(transfer("alice", "bob").arg(false))
            .unwrap()
            .await
            .unwrap();
        let named = transfer_method
            .call(
                CallArgs::named(json!({
                    "memo": "", "quantity": "1.0000 EOS", "to": "bob", "from": "alice"
                }))
                .arg(false),
            )
            .unwrap()
            .await
            .unwrap();
        assert_eq!(positional.transaction, named.transaction);
    }

    #[tokio::test]
    async fn test_newaccount_scope_is_creator_only() {
        let (api, _) = signing_api();
        let authority = json!({"threshold": 1, "keys": [], "accounts": []});
        let signed = api
            .action("newaccount")
            .unwrap()
            .call(
                CallArgs::new()
                    .arg("alice")
                    .arg("carol")
                    .arg(authority.clone())
                    .arg(authority.clone())
                    .arg(authority)
                    .arg("1.0000 EOS")
                    .settings(CallSettings::new().with_broadcast(false)),
            )
            .unwrap()
            .await
            .unwrap();
        assert_eq!(scope(&signed), vec!["alice"]);
        let authorization = &signed.transaction.messages[0].authorization;
        assert_eq!(authorization.len(), 1);
        assert_eq!(authorization[0].account.to_string(), "alice");
        assert_eq!(authorization[0].permission.to_string(), "active");
    }

    fn newaccount(authority: serde_json::Value) -> CallArgs {
        CallArgs::new()
            .arg("alice")
            .arg("carol")
            .arg(authority.clone())
            .arg(authority.clone())
            .arg(authority)
            .arg("1.0000 EOS")
            .settings(CallSettings::new().with_broadcast(false))
    }

    #[tokio::test]
    async fn test_authority_key_order_does_not_change_bytes() {
        let (api, _) = signing_api();
        let method = api.action("newaccount").unwrap();
        let first = method
            .call(newaccount(json!({
                "threshold": 1,
                "keys": [{"key": "EOS6MRyAjQq8ud7hVNYcfnVPJqcVpscN5So8BhtHuGYqET5GDW5CV", "weight": 1}],
                "accounts": []
            })))
            .unwrap()
            .await
            .unwrap();
        let second = method
            .call(newaccount(json!({
                "accounts": [],
                "keys": [{"weight": 1, "key": "EOS6MRyAjQq8ud7hVNYcfnVPJqcVpscN5So8BhtHuGYqET5GDW5CV"}],
                "threshold": 1
            })))
            .unwrap()
            .await
            .unwrap();
        assert_eq!(
            first.transaction.messages[0].data,
            second.transaction.messages[0].data
        );
    }

    #[tokio::test]
    async fn test_malformed_authority_is_rejected() {
        let (api, network) = signing_api();
        let err = api
            .action("newaccount")
            .unwrap()
            .call(newaccount(json!({"bogus": true})))
            .unwrap()
            .await
            .unwrap_err();
        assert!(matches!(err, WriteApiError::Validation(_)));
        assert!(network.pushed().is_empty());
    }

    #[tokio::test]
    async fn test_sign_false_without_provider() {
        let network = Arc::new(RecordingNetwork::default());
        let api = api_with(network.clone(), WriteApiConfig::local().with_chain_id(CHAIN_ID));
        let signed = api
            .action("transfer")
            .unwrap()
            .call(transfer("alice", "bob").arg(json!({"sign": false})))
            .unwrap()
            .await
            .unwrap();
        assert!(signed.signatures.is_empty());
        assert_eq!(network.pushed(), vec![signed]);
    }

    #[test]
    fn test_argument_errors() {
        let (api, network) = signing_api();
        let transfer_method = api.action("transfer").unwrap();

        let err = transfer_method
            .call(CallArgs::new().arg("alice").arg("bob"))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Argument error: transfer is expecting 4 parameters but 2 were provided: \
             transfer(from, to, quantity, memo, [settings])"
        );

        let err = transfer_method
            .call(CallArgs::named(json!({"from": "alice"})))
            .unwrap_err();
        assert!(matches!(err, WriteApiError::Argument(_)));
        assert!(network.pushed().is_empty());
    }

    #[test]
    fn test_usage() {
        let (api, _) = signing_api();
        let method = api.action("claim").unwrap();
        let usage = method.usage().unwrap();
        assert!(usage.starts_with("claim\n\nUSAGE\n"));
        assert!(usage.contains("\n\nEXAMPLE STRUCTURE\n"));

        match method.call(CallArgs::new()) {
            Err(WriteApiError::Usage(text)) => assert_eq!(text, usage),
            other => panic!("expected usage, got {other:?}"),
        }
    }
}

mod batch_tests {
    use super::*;
    use eos_write_api::{CallSettings, TransactionInput};

    #[tokio::test]
    async fn test_two_transfers_one_push() {
        let (api, network) = signing_api();
        let input = TransactionInput::batch(|collector| async move {
            collector.call("transfer", transfer("zed", "bob"))?;
            collector.call("transfer", transfer("alice", "zed"))?;
            Ok(())
        });
        let signed = api
            .transaction(input, CallSettings::new())
            .unwrap()
            .await
            .unwrap();

        assert_eq!(scope(&signed), vec!["alice", "bob", "zed"]);
        assert_eq!(signed.transaction.messages.len(), 2);
        assert_eq!(
            signed.transaction.messages[0].authorization[0]
                .account
                .to_string(),
            "zed"
        );
        assert_eq!(
            signed.transaction.messages[1].authorization[0]
                .account
                .to_string(),
            "alice"
        );
        assert_eq!(network.pushed(), vec![signed]);
    }

    #[tokio::test]
    async fn test_batch_with_callback_runs_once() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let (api, network) = signing_api();
        let calls = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = tokio::sync::oneshot::channel();
        let input = TransactionInput::batch(|collector| async move {
            collector.call("transfer", transfer("zed", "bob"))?;
            collector.call("transfer", transfer("alice", "zed"))?;
            Ok(())
        });
        let counter = calls.clone();
        api.transaction_with_callback(input, CallSettings::new(), move |result| {
            counter.fetch_add(1, Ordering::SeqCst);
            let _ = tx.send(result);
        })
        .unwrap();

        let signed = rx.await.unwrap().unwrap();
        tokio::task::yield_now().await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(signed.transaction.messages.len(), 2);
        assert_eq!(network.pushed(), vec![signed]);
    }

    #[tokio::test]
    async fn test_batch_with_broadcast_disabled() {
        let (api, network) = signing_api();
        let input = TransactionInput::batch(|collector| async move {
            collector.call("transfer", transfer("alice", "bob"))
        });
        let signed = api
            .transaction(input, CallSettings::from(false))
            .unwrap()
            .await
            .unwrap();
        assert_eq!(signed.signatures.len(), 1);
        assert!(network.pushed().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_member_fails_batch() {
        let (api, network) = signing_api();
        let input = TransactionInput::batch(|collector| async move {
            collector.call("transfer", transfer("alice", "bob"))?;
            let _ = collector.call("mint", transfer("alice", "bob"));
            Ok(())
        });
        let err = api
            .transaction(input, CallSettings::new())
            .unwrap()
            .await
            .unwrap_err();
        assert!(matches!(err, WriteApiError::Batch(ref m) if m.contains("mint")));
        assert!(network.pushed().is_empty());
    }
}

mod failure_tests {
    use super::*;

    fn rejecting_api() -> WriteApi {
        let config = WriteApiConfig::local()
            .with_chain_id(CHAIN_ID)
            .with_sign_provider(signer());
        api_with(Arc::new(RecordingNetwork::rejecting()), config)
    }

    #[tokio::test]
    async fn test_push_error_through_future() {
        let err = rejecting_api()
            .action("transfer")
            .unwrap()
            .call(transfer("alice", "bob"))
            .unwrap()
            .await
            .unwrap_err();
        assert!(err.to_string().contains("transaction rejected"));
        let digest = err.digest().unwrap();
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[tokio::test]
    async fn test_push_error_through_callback() {
        let (tx, rx) = tokio::sync::oneshot::channel();
        rejecting_api()
            .action("transfer")
            .unwrap()
            .call_with_callback(transfer("alice", "bob"), move |result| {
                let _ = tx.send(result);
            })
            .unwrap();
        let err = rx.await.unwrap().unwrap_err();
        assert!(matches!(err, WriteApiError::Network { .. }));
        assert!(err.digest().is_some());
    }
}

mod http_tests {
    use super::*;
    use std::time::Duration;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path},
    };

    #[tokio::test]
    async fn test_transfer_against_node() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chain/get_info"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "head_block_num": 12,
                "last_irreversible_block_num": 10,
                "head_block_time": "2018-06-01T12:00:00.500"
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/chain/get_block"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "0000000a0102030405060708090a0b0c0d0e0f101112131415161718191a1b1c",
                "block_num": 10
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/chain/push_transaction"))
            .respond_with(ResponseTemplate::new(202).set_body_json(serde_json::json!({
                "transaction_id": "feed",
                "processed": {}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let config = WriteApiConfig::custom(&server.uri())
            .unwrap()
            .with_chain_id(CHAIN_ID)
            .with_timeout(Duration::from_secs(5))
            .without_retry()
            .with_sign_provider(signer());
        init_tracing();
        let api = WriteApi::new(config).unwrap();

        let signed = api
            .action("transfer")
            .unwrap()
            .call(transfer("alice", "bob"))
            .unwrap()
            .await
            .unwrap();

        assert_eq!(signed.transaction.ref_block_num, 10);
        assert_eq!(signed.transaction.ref_block_prefix, 0x0807_0605);
        assert_eq!(
            signed.transaction.expiration.to_string(),
            "2018-06-01T12:01:00"
        );
        assert_eq!(signed.signatures.len(), 1);
    }
}

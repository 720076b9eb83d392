//! Test support and pipeline tests for the write API.

use crate::config::WriteApiConfig;
use crate::crypto::{LocalSigner, PendingSignature, SignProvider, SignRequest, SignatureSet};
use crate::error::{WriteApiError, WriteApiResult};
use crate::network::{Network, PushReceipt};
use crate::transaction::args::CallArgs;
use crate::transaction::types::{SignedTransaction, TransactionHeaders};
use crate::types::TimePointSec;
use crate::write_api::WriteApi;
use async_trait::async_trait;
use futures::FutureExt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub(crate) const TEST_CHAIN_ID: &str = "cf057bbfb72640471fd910bcb67639c22df9f92470936cddc1ade0e2f2e7dc4f";
pub(crate) const TEST_KEY: &str = "0101010101010101010101010101010101010101010101010101010101010101";
pub(crate) const HEAD_BLOCK_TIME: u32 = 1_500_000_000;

/// Deterministic chain stand-in that records what it was asked to push.
#[derive(Debug, Default)]
pub(crate) struct MockNetwork {
    fail_push: AtomicBool,
    context_requests: AtomicUsize,
    pushed: Mutex<Vec<SignedTransaction>>,
}

impl MockNetwork {
    pub(crate) fn failing() -> Self {
        let network = Self::default();
        network.fail_push.store(true, Ordering::SeqCst);
        network
    }

    pub(crate) fn pushed(&self) -> Vec<SignedTransaction> {
        self.pushed.lock().unwrap().clone()
    }

    pub(crate) fn context_requests(&self) -> usize {
        self.context_requests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Network for MockNetwork {
    async fn create_transaction(&self, expire_in_seconds: u64) -> WriteApiResult<TransactionHeaders> {
        self.context_requests.fetch_add(1, Ordering::SeqCst);
        Ok(TransactionHeaders {
            ref_block_num: 7,
            ref_block_prefix: 0xdead_beef,
            expiration: TimePointSec::new(HEAD_BLOCK_TIME).plus_seconds(expire_in_seconds),
        })
    }

    async fn push_transaction(&self, transaction: &SignedTransaction) -> WriteApiResult<PushReceipt> {
        if self.fail_push.load(Ordering::SeqCst) {
            return Err(WriteApiError::api(500, "node unavailable"));
        }
        self.pushed.lock().unwrap().push(transaction.clone());
        Ok(PushReceipt {
            transaction_id: Some("abc123".to_string()),
            processed: serde_json::Value::Null,
        })
    }
}

/// What a [`ScriptedSigner`] hands back.
#[derive(Clone, Debug)]
pub(crate) enum SignerScript {
    Return(Vec<SignatureSet>),
    /// Each set resolves after its delay in milliseconds.
    Delayed(Vec<(u64, SignatureSet)>),
    Fail(String),
}

/// Sign provider that records the bytes it was asked to sign.
#[derive(Debug)]
pub(crate) struct ScriptedSigner {
    script: SignerScript,
    seen: Mutex<Vec<Vec<u8>>>,
    extra: Mutex<Vec<serde_json::Map<String, serde_json::Value>>>,
}

impl ScriptedSigner {
    pub(crate) fn new(script: SignerScript) -> Self {
        Self {
            script,
            seen: Mutex::new(Vec::new()),
            extra: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn seen(&self) -> Vec<Vec<u8>> {
        self.seen.lock().unwrap().clone()
    }

    pub(crate) fn seen_extra(&self) -> Vec<serde_json::Map<String, serde_json::Value>> {
        self.extra.lock().unwrap().clone()
    }
}

impl SignProvider for ScriptedSigner {
    fn sign<'a>(&'a self, request: SignRequest<'a>) -> Vec<PendingSignature<'a>> {
        self.seen.lock().unwrap().push(request.buf.to_vec());
        self.extra.lock().unwrap().push(request.extra.clone());
        match &self.script {
            SignerScript::Return(sets) => sets
                .iter()
                .cloned()
                .map(|set| async move { Ok::<_, WriteApiError>(set) }.boxed())
                .collect(),
            SignerScript::Delayed(sets) => sets
                .iter()
                .cloned()
                .map(|(delay, set)| {
                    async move {
                        tokio::time::sleep(Duration::from_millis(delay)).await;
                        Ok::<_, WriteApiError>(set)
                    }
                    .boxed()
                })
                .collect(),
            SignerScript::Fail(message) => {
                let message = message.clone();
                vec![async move {
                    Err::<SignatureSet, _>(WriteApiError::Other(anyhow::anyhow!(message)))
                }
                .boxed()]
            }
        }
    }
}

pub(crate) fn test_config() -> WriteApiConfig {
    WriteApiConfig::local().with_chain_id(TEST_CHAIN_ID)
}

pub(crate) fn build_api(config: WriteApiConfig, network: Arc<MockNetwork>) -> WriteApi {
    WriteApi::builder(config)
        .with_network(network)
        .build()
        .unwrap()
}

/// A write API over the built-in schema, a mock network and one local key.
pub(crate) fn test_api() -> (WriteApi, Arc<MockNetwork>) {
    let network = Arc::new(MockNetwork::default());
    let signer = LocalSigner::from_hex_keys([TEST_KEY]).unwrap();
    let api = build_api(
        test_config().with_sign_provider(Arc::new(signer)),
        network.clone(),
    );
    (api, network)
}

pub(crate) fn transfer_args(from: &str, to: &str) -> CallArgs {
    CallArgs::new().arg(from).arg(to).arg("1.0000 EOS").arg("")
}

#[cfg(test)]
mod pipeline_tests {
    use super::*;
    use crate::codec::{BcsCodec, Codec};
    use crate::schema::{ActionDefinition, Schema};
    use crate::transaction::batch::TransactionInput;
    use crate::transaction::options::{CallSettings, TransactionOptions};
    use crate::types::{AccountName, ChainId, PermissionLevel};
    use serde_json::json;
    use sha2::{Digest, Sha256};

    fn name(s: &str) -> AccountName {
        s.parse().unwrap()
    }

    #[tokio::test]
    async fn test_transfer_is_signed_and_pushed() {
        let (api, network) = test_api();
        let signed = api
            .action("transfer")
            .unwrap()
            .call(transfer_args("bob", "alice"))
            .unwrap()
            .await
            .unwrap();

        assert_eq!(signed.transaction.scope, vec![name("alice"), name("bob")]);
        assert_eq!(signed.transaction.ref_block_num, 7);
        assert_eq!(signed.transaction.ref_block_prefix, 0xdead_beef);
        assert_eq!(signed.transaction.expiration.secs(), HEAD_BLOCK_TIME + 60);
        assert_eq!(signed.signatures.len(), 1);

        let message = &signed.transaction.messages[0];
        assert_eq!(message.code, name("eos"));
        assert_eq!(message.type_name, "transfer");
        assert_eq!(message.authorization, vec![PermissionLevel::active(name("bob"))]);
        assert!(!message.data.is_empty());

        assert_eq!(network.pushed(), vec![signed]);
    }

    #[tokio::test]
    async fn test_expiration_follows_settings() {
        let (api, _) = test_api();
        let signed = api
            .action("transfer")
            .unwrap()
            .call(transfer_args("alice", "bob").arg(json!({"expireInSeconds": 10})))
            .unwrap()
            .await
            .unwrap();
        assert_eq!(signed.transaction.expiration.secs(), HEAD_BLOCK_TIME + 10);
    }

    #[tokio::test]
    async fn test_broadcast_false_skips_push() {
        let (api, network) = test_api();
        let signed = api
            .action("transfer")
            .unwrap()
            .call(transfer_args("alice", "bob").arg(false))
            .unwrap()
            .await
            .unwrap();
        assert_eq!(signed.signatures.len(), 1);
        assert!(network.pushed().is_empty());
        assert_eq!(network.context_requests(), 1);
    }

    #[tokio::test]
    async fn test_sign_false_needs_no_provider() {
        let network = Arc::new(MockNetwork::default());
        let api = build_api(test_config(), network.clone());
        let signed = api
            .action("transfer")
            .unwrap()
            .call(transfer_args("alice", "bob").settings(CallSettings::new().with_sign(false)))
            .unwrap()
            .await
            .unwrap();
        assert!(signed.is_unsigned());
        assert_eq!(network.pushed().len(), 1);
    }

    #[tokio::test]
    async fn test_sign_false_skips_configured_provider() {
        let network = Arc::new(MockNetwork::default());
        let signer = Arc::new(ScriptedSigner::new(SignerScript::Return(vec![
            SignatureSet::One("sig-a".to_string()),
        ])));
        let api = build_api(
            test_config().with_sign_provider(signer.clone()),
            network.clone(),
        );
        let signed = api
            .action("transfer")
            .unwrap()
            .call(transfer_args("alice", "bob").settings(CallSettings::new().with_sign(false)))
            .unwrap()
            .await
            .unwrap();
        assert!(signed.is_unsigned());
        assert!(signer.seen().is_empty());
        assert_eq!(network.pushed(), vec![signed]);
    }

    #[tokio::test]
    async fn test_extra_settings_reach_sign_provider() {
        let network = Arc::new(MockNetwork::default());
        let signer = Arc::new(ScriptedSigner::new(SignerScript::Return(vec![
            SignatureSet::One("sig-a".to_string()),
        ])));
        let mut defaults = TransactionOptions::default();
        defaults.extra.insert("wallet".into(), json!("main"));
        let api = build_api(
            test_config()
                .with_transaction_options(defaults)
                .with_sign_provider(signer.clone()),
            network,
        );
        api.action("transfer")
            .unwrap()
            .call(transfer_args("alice", "bob").arg(json!({"keyHint": "owner"})))
            .unwrap()
            .await
            .unwrap();
        assert_eq!(
            signer.seen_extra(),
            vec![json!({"wallet": "main", "keyHint": "owner"})
                .as_object()
                .cloned()
                .unwrap()]
        );
    }

    #[test]
    fn test_missing_provider_fails_synchronously() {
        let network = Arc::new(MockNetwork::default());
        let api = build_api(test_config(), network.clone());
        let err = api
            .action("transfer")
            .unwrap()
            .call(transfer_args("alice", "bob"))
            .unwrap_err();
        assert!(matches!(err, WriteApiError::Config(_)));
        assert!(err.to_string().contains("sign provider"));
        assert_eq!(network.context_requests(), 0);
    }

    #[tokio::test]
    async fn test_signed_bytes_are_chain_id_then_transaction() {
        let network = Arc::new(MockNetwork::default());
        let signer = Arc::new(ScriptedSigner::new(SignerScript::Return(vec![
            SignatureSet::One("sig-a".to_string()),
            SignatureSet::Many(vec!["sig-b".to_string(), "sig-c".to_string()]),
        ])));
        let api = build_api(
            test_config().with_sign_provider(signer.clone()),
            network.clone(),
        );

        let signed = api
            .action("transfer")
            .unwrap()
            .call(transfer_args("alice", "bob"))
            .unwrap()
            .await
            .unwrap();
        assert_eq!(signed.signatures, vec!["sig-a", "sig-b", "sig-c"]);

        let chain_id = ChainId::from_hex(TEST_CHAIN_ID).unwrap();
        let mut expected = chain_id.as_bytes().to_vec();
        expected.extend(BcsCodec.encode(&signed.transaction).unwrap());
        assert_eq!(signer.seen(), vec![expected]);
    }

    #[tokio::test]
    async fn test_signatures_keep_request_order() {
        let network = Arc::new(MockNetwork::default());
        let signer = Arc::new(ScriptedSigner::new(SignerScript::Delayed(vec![
            (60, SignatureSet::One("sig-a".to_string())),
            (0, SignatureSet::Many(vec!["sig-b".to_string(), "sig-c".to_string()])),
            (20, SignatureSet::One("sig-d".to_string())),
        ])));
        let api = build_api(test_config().with_sign_provider(signer), network.clone());

        let signed = api
            .action("transfer")
            .unwrap()
            .call(transfer_args("alice", "bob"))
            .unwrap()
            .await
            .unwrap();
        assert_eq!(signed.signatures, vec!["sig-a", "sig-b", "sig-c", "sig-d"]);
        assert_eq!(network.pushed()[0].signatures, signed.signatures);
    }

    #[tokio::test]
    async fn test_empty_signature_results_are_rejected() {
        for script in [
            SignerScript::Return(vec![]),
            SignerScript::Return(vec![SignatureSet::Many(vec![])]),
            SignerScript::Return(vec![SignatureSet::One("  ".to_string())]),
        ] {
            let network = Arc::new(MockNetwork::default());
            let api = build_api(
                test_config().with_sign_provider(Arc::new(ScriptedSigner::new(script))),
                network.clone(),
            );
            let err = api
                .action("transfer")
                .unwrap()
                .call(transfer_args("alice", "bob"))
                .unwrap()
                .await
                .unwrap_err();
            assert!(matches!(err, WriteApiError::Signing(_)));
            assert!(network.pushed().is_empty());
        }
    }

    #[tokio::test]
    async fn test_provider_failure_is_signing_error() {
        let network = Arc::new(MockNetwork::default());
        let signer = ScriptedSigner::new(SignerScript::Fail("wallet locked".to_string()));
        let api = build_api(
            test_config().with_sign_provider(Arc::new(signer)),
            network.clone(),
        );
        let err = api
            .action("transfer")
            .unwrap()
            .call(transfer_args("alice", "bob"))
            .unwrap()
            .await
            .unwrap_err();
        assert!(matches!(err, WriteApiError::Signing(ref m) if m.contains("wallet locked")));
        assert!(network.pushed().is_empty());
    }

    #[tokio::test]
    async fn test_push_failure_carries_digest() {
        let network = Arc::new(MockNetwork::failing());
        let signer = LocalSigner::from_hex_keys([TEST_KEY]).unwrap();
        let api = build_api(
            test_config().with_sign_provider(Arc::new(signer)),
            network.clone(),
        );
        let transfer = api.action("transfer").unwrap();

        let unsent = transfer
            .call(transfer_args("alice", "bob").arg(false))
            .unwrap()
            .await
            .unwrap();
        let expected = hex::encode(Sha256::digest(
            &BcsCodec.encode(&unsent.transaction).unwrap(),
        ));

        let err = transfer
            .call(transfer_args("alice", "bob"))
            .unwrap()
            .await
            .unwrap_err();
        assert!(matches!(err, WriteApiError::Network { .. }));
        assert!(err.to_string().contains("node unavailable"));
        assert_eq!(err.digest(), Some(expected.as_str()));
    }

    #[tokio::test]
    async fn test_callback_receives_result() {
        let (api, network) = test_api();
        let (tx, rx) = tokio::sync::oneshot::channel();
        api.action("transfer")
            .unwrap()
            .call_with_callback(transfer_args("alice", "bob"), move |result| {
                let _ = tx.send(result);
            })
            .unwrap();
        let signed = rx.await.unwrap().unwrap();
        assert_eq!(network.pushed(), vec![signed]);
    }

    #[test]
    fn test_callback_outside_runtime() {
        let (api, _) = test_api();
        let err = api
            .action("transfer")
            .unwrap()
            .call_with_callback(transfer_args("alice", "bob"), |_| {})
            .unwrap_err();
        assert!(matches!(err, WriteApiError::Config(_)));
    }

    #[test]
    fn test_no_arguments_returns_usage() {
        let (api, network) = test_api();
        let err = api
            .action("claim")
            .unwrap()
            .call(CallArgs::new())
            .unwrap_err();
        match err {
            WriteApiError::Usage(text) => {
                assert!(text.starts_with("claim\n\nUSAGE\n"));
                assert_eq!(text, api.usage("claim").unwrap());
            }
            other => panic!("expected usage, got {other:?}"),
        }
        assert_eq!(network.context_requests(), 0);
    }

    #[test]
    fn test_scope_override_needs_authorization() {
        let (api, network) = test_api();
        let settings = CallSettings::new().with_scope(vec![name("carl")]);
        let err = api
            .action("transfer")
            .unwrap()
            .call(transfer_args("alice", "bob").settings(settings))
            .unwrap_err();
        assert!(matches!(err, WriteApiError::Validation(_)));
        assert_eq!(network.context_requests(), 0);
    }

    #[test]
    fn test_unknown_action() {
        let (api, _) = test_api();
        assert!(matches!(
            api.action("mint"),
            Err(WriteApiError::UnknownAction(ref n)) if n == "mint"
        ));
        assert!(api.definition("mint").is_none());
    }

    #[tokio::test]
    async fn test_transaction_from_request() {
        let (api, network) = test_api();
        let input = TransactionInput::from_value(json!({
            "scope": ["bob", "alice"],
            "messages": [{
                "code": "eos",
                "type": "transfer",
                "authorization": [{"account": "alice", "permission": "active"}],
                "data": {"from": "alice", "to": "bob", "quantity": "1.0000 EOS", "memo": "x"}
            }]
        }))
        .unwrap();
        let signed = api.transaction(input, CallSettings::new()).unwrap().await.unwrap();
        assert_eq!(signed.transaction.scope, vec![name("alice"), name("bob")]);
        assert_eq!(network.pushed().len(), 1);
    }

    #[tokio::test]
    async fn test_batch_is_one_transaction() {
        let (api, network) = test_api();
        let input = TransactionInput::batch(|collector| async move {
            collector.call("transfer", transfer_args("carol", "bob"))?;
            collector.call("transfer", transfer_args("alice", "carol"))?;
            Ok(())
        });
        let signed = api.transaction(input, CallSettings::new()).unwrap().await.unwrap();

        assert_eq!(
            signed.transaction.scope,
            vec![name("alice"), name("bob"), name("carol")]
        );
        assert_eq!(signed.transaction.messages.len(), 2);
        assert_eq!(
            signed.transaction.messages[0].authorization,
            vec![PermissionLevel::active(name("carol"))]
        );
        assert_eq!(network.pushed().len(), 1);
        assert_eq!(network.context_requests(), 1);
    }

    #[tokio::test]
    async fn test_batch_member_failure_pushes_nothing() {
        let (api, network) = test_api();
        let input = TransactionInput::batch(|collector| async move {
            collector.call("transfer", transfer_args("alice", "bob"))?;
            collector.call("transfer", CallArgs::new().arg("alice"))?;
            Ok(())
        });
        let err = api.transaction(input, CallSettings::new()).unwrap().await.unwrap_err();
        assert!(matches!(err, WriteApiError::Argument(_)));
        assert!(network.pushed().is_empty());
        assert_eq!(network.context_requests(), 0);
    }

    #[test]
    fn test_batch_requires_signer_upfront() {
        let api = build_api(test_config(), Arc::new(MockNetwork::default()));
        let input = TransactionInput::batch(|_| async { Ok(()) });
        let err = api.transaction(input, CallSettings::new()).unwrap_err();
        assert!(matches!(err, WriteApiError::Config(_)));
    }

    #[tokio::test]
    async fn test_config_defaults_apply() {
        let network = Arc::new(MockNetwork::default());
        let api = build_api(
            test_config().with_transaction_options(TransactionOptions {
                expire_in_seconds: 30,
                broadcast: false,
                sign: false,
                ..Default::default()
            }),
            network.clone(),
        );
        let signed = api
            .action("transfer")
            .unwrap()
            .call(transfer_args("alice", "bob"))
            .unwrap()
            .await
            .unwrap();
        assert!(signed.is_unsigned());
        assert_eq!(signed.transaction.expiration.secs(), HEAD_BLOCK_TIME + 30);
        assert!(network.pushed().is_empty());
    }

    #[test]
    fn test_builder_filters_actions() {
        let schema = Schema::default()
            .with_definition(ActionDefinition::new("transfer", [("from", "AccountName")]))
            .with_definition(ActionDefinition::new("transaction", [("from", "AccountName")]))
            .with_definition(ActionDefinition::new("Authority", [("threshold", "UInt32")]));
        let api = WriteApi::builder(test_config())
            .with_network(Arc::new(MockNetwork::default()))
            .with_schema(Arc::new(schema))
            .build()
            .unwrap();
        assert_eq!(api.actions().collect::<Vec<_>>(), vec!["transfer"]);
        assert!(api.usage("Authority").is_ok());
    }

    #[test]
    fn test_builder_rejects_bad_config() {
        let err = WriteApi::builder(WriteApiConfig::local())
            .with_network(Arc::new(MockNetwork::default()))
            .build()
            .unwrap_err();
        assert!(matches!(err, WriteApiError::Config(_)));

        let err = WriteApi::builder(test_config().with_contract("Not Valid"))
            .with_network(Arc::new(MockNetwork::default()))
            .build()
            .unwrap_err();
        assert!(matches!(err, WriteApiError::Config(_)));
    }
}

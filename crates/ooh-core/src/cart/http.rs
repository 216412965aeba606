//! HTTP client for the proposals API.
//!
//! - `GET  {base}/propostas/{id}`        -> proposal with its `itens`
//! - `PUT  {base}/propostas/{id}/itens`  <- `{ "itens": [...] }`, replaces all
//! - `GET  {base}/pontos/{id}`           -> placement with `fluxo` and `produtos`

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use url::Url;

use super::catalog::{CatalogProduct, PlacementCatalog, PlacementProducts};
use super::store::ProposalStore;
use crate::error::PersistenceError;
use crate::proposal::{Proposal, ProposalItem};

#[derive(Deserialize)]
struct ItemsEnvelope {
    #[serde(default)]
    itens: Vec<ProposalItem>,
}

#[derive(Deserialize)]
struct PlacementEnvelope {
    #[serde(default)]
    fluxo: Option<u64>,
    #[serde(default)]
    produtos: Vec<CatalogProduct>,
}

#[derive(Serialize)]
struct ReplaceBody<'a> {
    itens: &'a [ProposalItem],
}

/// Proposal store backed by the remote API.
#[derive(Debug, Clone)]
pub struct HttpProposalStore {
    client: reqwest::Client,
    base_url: Url,
    token: Option<String>,
}

impl HttpProposalStore {
    /// `base_url` is the API root, e.g. `https://host/api`.
    pub fn new(base_url: &str, token: Option<String>, timeout: Duration) -> Result<Self, PersistenceError> {
        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url,
            token,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, PersistenceError> {
        Ok(self.base_url.join(path)?)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.token {
            Some(ref token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, PersistenceError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        tracing::warn!(status = status.as_u16(), %body, "proposal store request failed");
        Err(PersistenceError::Status {
            status: status.as_u16(),
            body,
        })
    }

    /// Full proposal: name, tier and items.
    pub async fn fetch_proposal(&self, proposal_id: u64) -> Result<Proposal, PersistenceError> {
        let url = self.endpoint(&format!("propostas/{proposal_id}"))?;
        let response = Self::check(self.authorize(self.client.get(url)).send().await?).await?;
        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait]
impl ProposalStore for HttpProposalStore {
    async fn get_proposal_items(&self, proposal_id: u64) -> Result<Vec<ProposalItem>, PersistenceError> {
        let url = self.endpoint(&format!("propostas/{proposal_id}"))?;
        let response = Self::check(self.authorize(self.client.get(url)).send().await?).await?;
        let text = response.text().await?;
        let envelope: ItemsEnvelope = serde_json::from_str(&text)?;
        tracing::debug!(proposal_id, items = envelope.itens.len(), "fetched proposal items");
        Ok(envelope.itens)
    }

    async fn replace_proposal_items(
        &self,
        proposal_id: u64,
        items: &[ProposalItem],
    ) -> Result<(), PersistenceError> {
        let url = self.endpoint(&format!("propostas/{proposal_id}/itens"))?;
        let request = self.authorize(self.client.put(url)).json(&ReplaceBody { itens: items });
        Self::check(request.send().await?).await?;
        tracing::info!(proposal_id, items = items.len(), "replaced proposal items");
        Ok(())
    }
}

#[async_trait]
impl PlacementCatalog for HttpProposalStore {
    async fn get_placement_products(&self, placement_id: u64) -> Result<PlacementProducts, PersistenceError> {
        let url = self.endpoint(&format!("pontos/{placement_id}"))?;
        let response = Self::check(self.authorize(self.client.get(url)).send().await?).await?;
        let text = response.text().await?;
        let placement: PlacementEnvelope = serde_json::from_str(&text)?;
        Ok(PlacementProducts::from_products(
            &placement.produtos,
            placement.fluxo.unwrap_or(0),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    const PROPOSAL_JSON: &str = r#"{
        "id": 5,
        "nome": "Campanha Verão",
        "comissao": "V3",
        "itens": [{
            "id": 1,
            "id_ooh": 77,
            "periodo_inicio": "2026-01-12T00:00:00Z",
            "periodo_fim": "2026-01-25",
            "periodo_comercializado": "bissemanal",
            "valor_locacao": 1000,
            "valor_papel": 200,
            "valor_lona": 150,
            "fluxo_diario": 10000,
            "cidade": "Curitiba"
        }]
    }"#;

    fn store(server: &mockito::ServerGuard) -> HttpProposalStore {
        HttpProposalStore::new(
            &format!("{}/api", server.url()),
            Some("tok".into()),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn fetches_items_with_bearer_token() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/propostas/5")
            .match_header("authorization", "Bearer tok")
            .with_status(200)
            .with_body(PROPOSAL_JSON)
            .create_async()
            .await;

        let items = store(&server).get_proposal_items(5).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id_ooh, 77);
        assert_eq!(items[0].daily_flow, 10_000);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn fetch_proposal_reads_metadata() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/propostas/5")
            .with_status(200)
            .with_body(PROPOSAL_JSON)
            .create_async()
            .await;

        let proposal = store(&server).fetch_proposal(5).await.unwrap();
        assert_eq!(proposal.name, "Campanha Verão");
        assert_eq!(proposal.commission_tier, crate::pricing::CommissionTier::V3);
    }

    #[tokio::test]
    async fn replace_sends_whole_item_list() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("PUT", "/api/propostas/5/itens")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "itens": [{ "id_ooh": 77, "periodo_inicio": "2026-01-12" }]
            })))
            .with_status(200)
            .with_body(r#"{"success":true}"#)
            .create_async()
            .await;

        let items = serde_json::from_str::<ItemsEnvelope>(PROPOSAL_JSON).unwrap().itens;
        store(&server).replace_proposal_items(5, &items).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn error_status_becomes_persistence_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("PUT", "/api/propostas/5/itens")
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let err = store(&server).replace_proposal_items(5, &[]).await.unwrap_err();
        match err {
            PersistenceError::Status { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body, "boom");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn placement_products_come_from_product_rows() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/pontos/77")
            .match_header("authorization", "Bearer tok")
            .with_status(200)
            .with_body(
                r#"{
                    "id": 77,
                    "endereco": "Av. Sete de Setembro, 100",
                    "fluxo": 12000,
                    "imagens": [],
                    "produtos": [
                        { "id": 1, "id_ponto": 77, "tipo": "Papel", "valor": 200, "periodo": null },
                        { "id": 2, "id_ponto": 77, "tipo": "Locação Bissemanal", "valor": 1000, "periodo": "bissemanal" }
                    ]
                }"#,
            )
            .create_async()
            .await;

        let products = store(&server).get_placement_products(77).await.unwrap();
        assert_eq!(products.rental_base, 1000.0);
        assert_eq!(products.paper_base, 200.0);
        assert_eq!(products.canvas_base, 0.0);
        assert_eq!(products.daily_flow, 12_000);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn missing_placement_is_a_status_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/pontos/9")
            .with_status(404)
            .with_body(r#"{"error":"Ponto não encontrado"}"#)
            .create_async()
            .await;

        let err = store(&server).get_placement_products(9).await.unwrap_err();
        assert!(matches!(err, PersistenceError::Status { status: 404, .. }));
    }

    #[test]
    fn base_url_gets_trailing_slash() {
        let s = HttpProposalStore::new("http://localhost/api", None, Duration::from_secs(1)).unwrap();
        assert_eq!(s.base_url().as_str(), "http://localhost/api/");
        assert!(HttpProposalStore::new("not a url", None, Duration::from_secs(1)).is_err());
    }
}

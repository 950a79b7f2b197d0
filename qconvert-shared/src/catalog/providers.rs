/// Benchmark provider catalog
///
/// Static description of the quantum hardware providers the benchmark page
/// lists. Status is part of the catalog; nothing polls real hardware.

use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderStatus {
    Online,
    Offline,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BenchmarkProvider {
    pub id: &'static str,
    pub name: &'static str,
    pub qubits: u32,
    pub status: ProviderStatus,
}

/// Aggregate over the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderStatusSummary {
    pub providers: usize,
    pub online: usize,
    pub offline: usize,
    pub checked_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ProviderCatalog {
    providers: Vec<BenchmarkProvider>,
}

impl ProviderCatalog {
    pub fn builtin() -> Self {
        Self {
            providers: vec![
                BenchmarkProvider {
                    id: "ibm",
                    name: "IBM Quantum",
                    qubits: 127,
                    status: ProviderStatus::Online,
                },
                BenchmarkProvider {
                    id: "google",
                    name: "Google Quantum AI",
                    qubits: 72,
                    status: ProviderStatus::Online,
                },
                BenchmarkProvider {
                    id: "aws",
                    name: "Amazon Braket",
                    qubits: 79,
                    status: ProviderStatus::Online,
                },
                BenchmarkProvider {
                    id: "rigetti",
                    name: "Rigetti",
                    qubits: 84,
                    status: ProviderStatus::Offline,
                },
                BenchmarkProvider {
                    id: "ionq",
                    name: "IonQ",
                    qubits: 32,
                    status: ProviderStatus::Online,
                },
            ],
        }
    }

    pub fn all(&self) -> &[BenchmarkProvider] {
        &self.providers
    }

    pub fn summary(&self, checked_at: DateTime<Utc>) -> ProviderStatusSummary {
        let online = self
            .providers
            .iter()
            .filter(|p| p.status == ProviderStatus::Online)
            .count();

        ProviderStatusSummary {
            providers: self.providers.len(),
            online,
            offline: self.providers.len() - online,
            checked_at,
        }
    }
}

/// Quantum library catalog
///
/// The set of libraries the converter understands is closed ([`LibraryId`]).
/// The `quantum_libraries` table holds descriptive data for each and is
/// filled by [`QuantumLibrary::seed_builtin`], which is safe to call any
/// number of times.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

/// Identifier of a supported quantum programming library
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LibraryId {
    Qiskit,
    Cirq,
    Pennylane,
    Braket,
    Pyquil,
}

impl LibraryId {
    pub const ALL: [LibraryId; 5] = [
        LibraryId::Qiskit,
        LibraryId::Cirq,
        LibraryId::Pennylane,
        LibraryId::Braket,
        LibraryId::Pyquil,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LibraryId::Qiskit => "qiskit",
            LibraryId::Cirq => "cirq",
            LibraryId::Pennylane => "pennylane",
            LibraryId::Braket => "braket",
            LibraryId::Pyquil => "pyquil",
        }
    }
}

impl fmt::Display for LibraryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string names no supported library
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unsupported library: {0}")]
pub struct UnknownLibrary(pub String);

impl FromStr for LibraryId {
    type Err = UnknownLibrary;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LibraryId::ALL
            .into_iter()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| UnknownLibrary(s.to_string()))
    }
}

/// Library catalog entry
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct QuantumLibrary {
    /// Library id (`qiskit`, `cirq`, ...)
    #[serde(rename = "name")]
    pub id: String,
    pub display_name: String,
    pub description: String,
    pub language: String,
    pub version: String,
    pub website: String,
    pub created_at: DateTime<Utc>,
}

/// Descriptive data for a built-in library
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryInfo {
    pub name: LibraryId,
    pub display_name: &'static str,
    pub description: &'static str,
    pub language: &'static str,
    pub version: &'static str,
    pub website: &'static str,
}

/// The built-in catalog, in display order
pub fn builtin_libraries() -> Vec<LibraryInfo> {
    vec![
        LibraryInfo {
            name: LibraryId::Qiskit,
            display_name: "Qiskit",
            description: "IBM's open-source SDK for working with quantum computers at the level of circuits, pulses and algorithms",
            language: "Python",
            version: "1.0",
            website: "https://qiskit.org",
        },
        LibraryInfo {
            name: LibraryId::Cirq,
            display_name: "Cirq",
            description: "Google's framework for writing, manipulating and optimizing quantum circuits for NISQ devices",
            language: "Python",
            version: "1.3",
            website: "https://quantumai.google/cirq",
        },
        LibraryInfo {
            name: LibraryId::Pennylane,
            display_name: "PennyLane",
            description: "Xanadu's library for differentiable programming of quantum computers and quantum machine learning",
            language: "Python",
            version: "0.35",
            website: "https://pennylane.ai",
        },
        LibraryInfo {
            name: LibraryId::Braket,
            display_name: "Amazon Braket",
            description: "AWS SDK for building quantum algorithms and running them on simulators and managed quantum hardware",
            language: "Python",
            version: "1.70",
            website: "https://aws.amazon.com/braket",
        },
        LibraryInfo {
            name: LibraryId::Pyquil,
            display_name: "PyQuil",
            description: "Rigetti's library for generating and executing Quil programs on the Forest platform",
            language: "Python",
            version: "4.6",
            website: "https://pyquil-docs.rigetti.com",
        },
    ]
}

impl QuantumLibrary {
    /// Lists the catalog in display order
    pub async fn list(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, QuantumLibrary>(
            r#"
            SELECT id, display_name, description, language, version, website, created_at
            FROM quantum_libraries
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .fetch_all(pool)
        .await
    }

    /// Upserts every built-in library; returns how many were written
    pub async fn seed_builtin(pool: &PgPool) -> Result<usize, sqlx::Error> {
        let libraries = builtin_libraries();

        for lib in &libraries {
            sqlx::query(
                r#"
                INSERT INTO quantum_libraries (id, display_name, description, language, version, website)
                VALUES ($1, $2, $3, $4, $5, $6)
                ON CONFLICT (id) DO UPDATE
                SET display_name = EXCLUDED.display_name,
                    description = EXCLUDED.description,
                    language = EXCLUDED.language,
                    version = EXCLUDED.version,
                    website = EXCLUDED.website
                "#,
            )
            .bind(lib.name.as_str())
            .bind(lib.display_name)
            .bind(lib.description)
            .bind(lib.language)
            .bind(lib.version)
            .bind(lib.website)
            .execute(pool)
            .await?;
        }

        tracing::info!(count = libraries.len(), "Seeded quantum library catalog");

        Ok(libraries.len())
    }
}

//! Explicit schema registry for the synchronized tables.
//!
//! Every table the orchestrator touches is a [`SyncTable`] variant, and every
//! variant owns a static [`TableSchema`] that pairs each remote column with
//! its local field. Keys missing from a schema fall back to the heuristics in
//! [`crate::naming`].

use crate::naming::{camel_to_snake, snake_to_camel};
use crate::TypesError;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Value kind of a column, used for date handling and local DDL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Integer,
    /// A UUID, carried as text in both stores.
    Uuid,
    Float,
    Text,
    Boolean,
    /// A calendar date; anchored to midnight UTC.
    Date,
    Timestamp,
    Json,
}

impl FieldKind {
    /// Returns true for kinds that hold instants.
    #[must_use]
    pub const fn is_temporal(self) -> bool {
        matches!(self, Self::Date | Self::Timestamp)
    }
}

/// One column, named in both stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// snake_case column name in the remote store.
    pub remote: &'static str,
    /// Field name in the local store.
    pub local: &'static str,
    pub kind: FieldKind,
}

const fn field(remote: &'static str, local: &'static str, kind: FieldKind) -> FieldSpec {
    FieldSpec { remote, local, kind }
}

/// Schema of one table in both stores.
#[derive(Debug, PartialEq, Eq)]
pub struct TableSchema {
    pub remote_name: &'static str,
    pub local_name: &'static str,
    pub primary_key: FieldSpec,
    pub fields: &'static [FieldSpec],
}

impl TableSchema {
    /// Looks up a field by its remote column name.
    #[must_use]
    pub fn field_by_remote(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.remote == name)
    }

    /// Looks up a field by its local name.
    #[must_use]
    pub fn field_by_local(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.local == name)
    }

    /// Local name for a remote column; unmapped columns use snake→camel.
    #[must_use]
    pub fn local_name_for<'a>(&self, remote: &'a str) -> Cow<'a, str> {
        match self.field_by_remote(remote) {
            Some(f) => Cow::Borrowed(f.local),
            None => Cow::Owned(snake_to_camel(remote)),
        }
    }

    /// Remote column for a local name; unmapped fields use camel→snake.
    #[must_use]
    pub fn remote_name_for<'a>(&self, local: &'a str) -> Cow<'a, str> {
        match self.field_by_local(local) {
            Some(f) => Cow::Borrowed(f.remote),
            None => Cow::Owned(camel_to_snake(local)),
        }
    }

    /// The last-modified column, if the table has one.
    #[must_use]
    pub fn updated_at(&self) -> Option<&FieldSpec> {
        self.field_by_remote("updated_at")
    }

    /// Audit timestamps are never compared.
    #[must_use]
    pub fn is_audit_field(name: &str) -> bool {
        ["created_at", "updated_at", "createdAt", "updatedAt"]
            .iter()
            .any(|marker| name.contains(marker))
    }

    fn validate(&self) -> Result<(), TypesError> {
        let invalid = |reason: String| TypesError::InvalidSchema {
            table: self.remote_name.to_string(),
            reason,
        };

        if self.fields.is_empty() {
            return Err(invalid("no fields".into()));
        }
        if !self.fields.contains(&self.primary_key) {
            return Err(invalid(format!(
                "primary key {} is not listed among the fields",
                self.primary_key.remote
            )));
        }

        let mut remote = HashSet::new();
        let mut local = HashSet::new();
        for f in self.fields {
            if !remote.insert(f.remote) {
                return Err(invalid(format!("duplicate remote column {}", f.remote)));
            }
            if !local.insert(f.local) {
                return Err(invalid(format!("duplicate local field {}", f.local)));
            }
        }
        Ok(())
    }
}

/// Validates the schema of every listed table. Run once at startup.
pub fn validate_schemas(tables: &[SyncTable]) -> Result<(), TypesError> {
    tables.iter().try_for_each(|t| t.schema().validate())?;
    SYNC_LOG_SCHEMA.validate()
}

/// The tables kept in sync, in orchestration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncTable {
    Escolas,
    Inscricoes,
    VerificationCodes,
    Monitores,
    Turmas,
    Frequencia,
    TurmasAlunas,
    Cursos,
    Aulas,
    MateriaisAula,
    Modulos,
    TurmasMonitores,
    Eventos,
    Modalidades,
    Orientadores,
    InscricoesEventos,
    ParticipantesEventos,
}

impl SyncTable {
    /// Every synchronized table, in the order a run visits them.
    pub const ALL: [SyncTable; 17] = [
        Self::Escolas,
        Self::Inscricoes,
        Self::VerificationCodes,
        Self::Monitores,
        Self::Turmas,
        Self::Frequencia,
        Self::TurmasAlunas,
        Self::Cursos,
        Self::Aulas,
        Self::MateriaisAula,
        Self::Modulos,
        Self::TurmasMonitores,
        Self::Eventos,
        Self::Modalidades,
        Self::Orientadores,
        Self::InscricoesEventos,
        Self::ParticipantesEventos,
    ];

    /// The remote table name, which is also the public name of the table.
    #[must_use]
    pub fn name(self) -> &'static str {
        self.schema().remote_name
    }

    /// The table's schema.
    #[must_use]
    pub fn schema(self) -> &'static TableSchema {
        match self {
            Self::Escolas => &ESCOLAS,
            Self::Inscricoes => &INSCRICOES,
            Self::VerificationCodes => &VERIFICATION_CODES,
            Self::Monitores => &MONITORES,
            Self::Turmas => &TURMAS,
            Self::Frequencia => &FREQUENCIA,
            Self::TurmasAlunas => &TURMAS_ALUNAS,
            Self::Cursos => &CURSOS,
            Self::Aulas => &AULAS,
            Self::MateriaisAula => &MATERIAIS_AULA,
            Self::Modulos => &MODULOS,
            Self::TurmasMonitores => &TURMAS_MONITORES,
            Self::Eventos => &EVENTOS,
            Self::Modalidades => &MODALIDADES,
            Self::Orientadores => &ORIENTADORES,
            Self::InscricoesEventos => &INSCRICOES_EVENTOS,
            Self::ParticipantesEventos => &PARTICIPANTES_EVENTOS,
        }
    }
}

impl fmt::Display for SyncTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SyncTable {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.name() == s)
            .ok_or_else(|| TypesError::UnknownTable(s.to_string()))
    }
}

use FieldKind::{Boolean, Date, Float, Integer, Json, Text, Timestamp, Uuid};

const ID: FieldSpec = field("id", "id", Uuid);
const SERIAL_ID: FieldSpec = field("id", "id", Integer);
const CREATED_AT: FieldSpec = field("created_at", "createdAt", Timestamp);
const UPDATED_AT: FieldSpec = field("updated_at", "updatedAt", Timestamp);

static ESCOLAS: TableSchema = TableSchema {
    remote_name: "escolas",
    local_name: "escolas",
    primary_key: ID,
    fields: &[
        ID,
        field("nome", "nome", Text),
        field("rede", "rede", Text),
        field("cidade", "cidade", Text),
        field("estado", "estado", Text),
        CREATED_AT,
        UPDATED_AT,
    ],
};

// Enrollment columns keep their snake_case names locally; only the audit
// columns follow the ORM convention.
static INSCRICOES: TableSchema = TableSchema {
    remote_name: "inscricoes",
    local_name: "inscricoes",
    primary_key: ID,
    fields: &[
        ID,
        field("email", "email", Text),
        field("nome", "nome", Text),
        field("cpf", "cpf", Text),
        field("data_nascimento", "data_nascimento", Date),
        field("cep", "cep", Text),
        field("logradouro", "logradouro", Text),
        field("numero", "numero", Text),
        field("complemento", "complemento", Text),
        field("bairro", "bairro", Text),
        field("cidade", "cidade", Text),
        field("estado", "estado", Text),
        field("nome_responsavel", "nome_responsavel", Text),
        field("telefone_whatsapp", "telefone_whatsapp", Text),
        field("escolaridade", "escolaridade", Text),
        field("ano_escolar", "ano_escolar", Text),
        field("escola", "escola", Text),
        field("curso", "curso", Text),
        field("status", "status", Text),
        CREATED_AT,
        UPDATED_AT,
    ],
};

static VERIFICATION_CODES: TableSchema = TableSchema {
    remote_name: "verification_codes",
    local_name: "verificationCodes",
    primary_key: ID,
    fields: &[
        ID,
        field("email", "email", Text),
        field("code", "code", Text),
        field("expires_at", "expiresAt", Timestamp),
        field("used", "used", Boolean),
        CREATED_AT,
    ],
};

static MONITORES: TableSchema = TableSchema {
    remote_name: "monitores",
    local_name: "monitores",
    primary_key: ID,
    fields: &[
        ID,
        field("nome", "nome", Text),
        field("email", "email", Text),
        field("telefone", "telefone", Text),
        field("ativo", "ativo", Boolean),
        CREATED_AT,
        UPDATED_AT,
    ],
};

static TURMAS: TableSchema = TableSchema {
    remote_name: "turmas",
    local_name: "turmas",
    primary_key: ID,
    fields: &[
        ID,
        field("curso_id", "cursoId", Uuid),
        field("codigo_turma", "codigoTurma", Text),
        field("ano_letivo", "anoLetivo", Integer),
        field("turno", "turno", Text),
        field("status", "status", Text),
        CREATED_AT,
        UPDATED_AT,
    ],
};

static FREQUENCIA: TableSchema = TableSchema {
    remote_name: "frequencia",
    local_name: "frequencia",
    primary_key: ID,
    fields: &[
        ID,
        field("aula_id", "aulaId", Uuid),
        field("aluna_id", "alunaId", Uuid),
        field("presente", "presente", Boolean),
        field("justificativa", "justificativa", Text),
        CREATED_AT,
    ],
};

static TURMAS_ALUNAS: TableSchema = TableSchema {
    remote_name: "turmas_alunas",
    local_name: "turmasAlunas",
    primary_key: ID,
    fields: &[
        ID,
        field("turma_id", "turmaId", Uuid),
        field("aluna_id", "alunaId", Uuid),
        field("status", "status", Text),
        CREATED_AT,
    ],
};

static CURSOS: TableSchema = TableSchema {
    remote_name: "cursos",
    local_name: "cursos",
    primary_key: ID,
    fields: &[
        ID,
        field("nome_curso", "nomeCurso", Text),
        field("descricao", "descricao", Text),
        field("carga_horaria", "cargaHoraria", Integer),
        field("publico_alvo", "publicoAlvo", Text),
        CREATED_AT,
        UPDATED_AT,
    ],
};

static AULAS: TableSchema = TableSchema {
    remote_name: "aulas",
    local_name: "aulas",
    primary_key: ID,
    fields: &[
        ID,
        field("turma_id", "turmaId", Uuid),
        field("modulo_id", "moduloId", Uuid),
        field("data_aula", "dataAula", Date),
        field("nome_aula", "nomeAula", Text),
        field("conteudo_ministrado", "conteudoMinistrado", Text),
        CREATED_AT,
        UPDATED_AT,
    ],
};

static MATERIAIS_AULA: TableSchema = TableSchema {
    remote_name: "materiais_aula",
    local_name: "materiaisAula",
    primary_key: ID,
    fields: &[
        ID,
        field("aula_id", "aulaId", Uuid),
        field("nome_material", "nomeMaterial", Text),
        field("tipo_material", "tipoMaterial", Text),
        field("url_material", "urlMaterial", Text),
        CREATED_AT,
    ],
};

static MODULOS: TableSchema = TableSchema {
    remote_name: "modulos",
    local_name: "modulos",
    primary_key: ID,
    fields: &[
        ID,
        field("turma_id", "turmaId", Uuid),
        field("nome_modulo", "nomeModulo", Text),
        field("quantidade_aulas", "quantidadeAulas", Integer),
        CREATED_AT,
        UPDATED_AT,
    ],
};

static TURMAS_MONITORES: TableSchema = TableSchema {
    remote_name: "turmas_monitores",
    local_name: "turmasMonitores",
    primary_key: ID,
    fields: &[
        ID,
        field("turma_id", "turmaId", Uuid),
        field("monitor_id", "monitorId", Uuid),
        CREATED_AT,
    ],
};

static EVENTOS: TableSchema = TableSchema {
    remote_name: "eventos",
    local_name: "eventos",
    primary_key: ID,
    fields: &[
        ID,
        field("nome", "nome", Text),
        field("descricao", "descricao", Text),
        field("data_inicio", "dataInicio", Timestamp),
        field("data_fim", "dataFim", Timestamp),
        field("local", "local", Text),
        field("ativo", "ativo", Boolean),
        field("configuracoes", "configuracoes", Json),
        CREATED_AT,
        UPDATED_AT,
    ],
};

static MODALIDADES: TableSchema = TableSchema {
    remote_name: "modalidades",
    local_name: "modalidades",
    primary_key: ID,
    fields: &[
        ID,
        field("evento_id", "eventoId", Uuid),
        field("nome", "nome", Text),
        field("descricao", "descricao", Text),
        field("limite_vagas", "limiteVagas", Integer),
        field("vagas_ocupadas", "vagasOcupadas", Integer),
        CREATED_AT,
        UPDATED_AT,
    ],
};

static ORIENTADORES: TableSchema = TableSchema {
    remote_name: "orientadores",
    local_name: "orientadores",
    primary_key: ID,
    fields: &[
        ID,
        field("nome", "nome", Text),
        field("email", "email", Text),
        field("telefone", "telefone", Text),
        field("escola", "escola", Text),
        CREATED_AT,
        UPDATED_AT,
    ],
};

static INSCRICOES_EVENTOS: TableSchema = TableSchema {
    remote_name: "inscricoes_eventos",
    local_name: "inscricoesEventos",
    primary_key: ID,
    fields: &[
        ID,
        field("evento_id", "eventoId", Uuid),
        field("orientador_id", "orientadorId", Uuid),
        field("modalidade_id", "modalidadeId", Uuid),
        field("nome_equipe", "nomeEquipe", Text),
        field("status", "status", Text),
        field("observacoes", "observacoes", Text),
        field("pontuacao", "pontuacao", Float),
        CREATED_AT,
        UPDATED_AT,
    ],
};

static PARTICIPANTES_EVENTOS: TableSchema = TableSchema {
    remote_name: "participantes_eventos",
    local_name: "participantesEventos",
    primary_key: ID,
    fields: &[
        ID,
        field("inscricao_id", "inscricaoId", Uuid),
        field("nome", "nome", Text),
        field("email", "email", Text),
        field("data_nascimento", "dataNascimento", Date),
        CREATED_AT,
        UPDATED_AT,
    ],
};

/// Append-only audit table for daily run summaries. Remote only, keyed by
/// a serial id the database assigns.
pub static SYNC_LOG_SCHEMA: TableSchema = TableSchema {
    remote_name: "sync_logs",
    local_name: "syncLogs",
    primary_key: SERIAL_ID,
    fields: &[
        SERIAL_ID,
        field("timestamp", "timestamp", Timestamp),
        field("type", "type", Text),
        field("total_synced", "totalSynced", Integer),
        field("total_errors", "totalErrors", Integer),
        field("tables_processed", "tablesProcessed", Integer),
        field("details", "details", Json),
    ],
};

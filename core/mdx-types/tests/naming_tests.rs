use mdx_types::naming::{camel_to_snake, snake_to_camel};

// ── camel → snake ────────────────────────────────────────────────

#[test]
fn camel_to_snake_inserts_boundaries() {
    assert_eq!(camel_to_snake("dataNascimento"), "data_nascimento");
    assert_eq!(camel_to_snake("nomeResponsavelLegal"), "nome_responsavel_legal");
}

#[test]
fn camel_to_snake_digit_boundary() {
    assert_eq!(camel_to_snake("turma2Id"), "turma2_id");
}

#[test]
fn camel_to_snake_without_boundary_is_unchanged() {
    assert_eq!(camel_to_snake("nome"), "nome");
    assert_eq!(camel_to_snake("data_nascimento"), "data_nascimento");
}

#[test]
fn camel_to_snake_collapses_double_underscores() {
    assert_eq!(camel_to_snake("foo_Bar"), "foo_bar");
    assert_eq!(camel_to_snake("a__b"), "a_b");
}

#[test]
fn camel_to_snake_leading_capital_has_no_underscore() {
    assert_eq!(camel_to_snake("Nome"), "nome");
}

// ── snake → camel ────────────────────────────────────────────────

#[test]
fn snake_to_camel_uppercases_after_underscore() {
    assert_eq!(snake_to_camel("data_nascimento"), "dataNascimento");
    assert_eq!(snake_to_camel("created_at"), "createdAt");
}

#[test]
fn snake_to_camel_keeps_underscore_before_non_letter() {
    assert_eq!(snake_to_camel("turma_1"), "turma_1");
    assert_eq!(snake_to_camel("trailing_"), "trailing_");
}

#[test]
fn snake_to_camel_without_boundary_is_unchanged() {
    assert_eq!(snake_to_camel("nome"), "nome");
    assert_eq!(snake_to_camel("nomeCurso"), "nomeCurso");
}


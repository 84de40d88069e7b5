//! User-facing summaries attached to each response before display.

use serde_json::Value;

use crate::response::HttpMethod;

/// Short Portuguese summary of a completed request, keyed by endpoint and
/// status. Display only: nothing downstream parses it.
#[must_use]
pub fn friendly_message(method: HttpMethod, path: &str, status: u16, data: &Value) -> String {
    let success = (200..300).contains(&status);

    if path.contains("/auth/login") {
        return if success {
            "✅ Login realizado com sucesso! Bem-vindo ao sistema.".to_string()
        } else if status == 401 {
            "❌ Credenciais inválidas. Verifique seu usuário e senha.".to_string()
        } else {
            "❌ Erro no login. Tente novamente.".to_string()
        };
    }

    if path.contains("/auth/me") {
        return if success {
            "✅ Informações do usuário carregadas com sucesso.".to_string()
        } else if status == 401 {
            "❌ Sessão expirada. Faça login novamente.".to_string()
        } else {
            "❌ Erro ao carregar informações do usuário.".to_string()
        };
    }

    if let Some(message) = resource_message(method, path, success, data) {
        return message;
    }

    if path.contains("/health") {
        return if success {
            "💚 Sistema funcionando perfeitamente!".to_string()
        } else {
            "❌ Problema no sistema. Verifique a conectividade.".to_string()
        };
    }

    generic_message(status)
}

fn resource_message(method: HttpMethod, path: &str, success: bool, data: &Value) -> Option<String> {
    let (emoji, listed, list_failed, created, create_failed) = if path.contains("/documents") {
        (
            "📄",
            "documento(s) encontrado(s).",
            "❌ Erro ao listar documentos.",
            "✅ Documento criado com sucesso!",
            "❌ Erro ao criar documento.",
        )
    } else if path.contains("/deadlines") {
        (
            "⏰",
            "prazo(s) encontrado(s).",
            "❌ Erro ao listar prazos.",
            "✅ Prazo criado com sucesso!",
            "❌ Erro ao criar prazo.",
        )
    } else if path.contains("/hearings") {
        (
            "⚖️",
            "audiência(s) encontrada(s).",
            "❌ Erro ao listar audiências.",
            "✅ Audiência agendada com sucesso!",
            "❌ Erro ao agendar audiência.",
        )
    } else {
        return None;
    };

    let message = match (method, success) {
        (HttpMethod::Get, true) => format!("{emoji} {} {listed}", item_count(data)),
        (HttpMethod::Get, false) => list_failed.to_string(),
        (HttpMethod::Post, true) => created.to_string(),
        (HttpMethod::Post, false) => create_failed.to_string(),
        _ => return None,
    };
    Some(message)
}

fn generic_message(status: u16) -> String {
    match status {
        200..=299 => "✅ Operação realizada com sucesso!".to_string(),
        401 => "❌ Não autorizado. Faça login novamente.".to_string(),
        403 => "❌ Acesso negado. Você não tem permissão para esta operação.".to_string(),
        404 => "❌ Recurso não encontrado.".to_string(),
        500 => "❌ Erro interno do servidor. Tente novamente mais tarde.".to_string(),
        400.. => format!("❌ Erro na operação ({status})."),
        _ => format!("ℹ️ Status: {status}"),
    }
}

/// Row count of a listing payload: a bare array, or `items`; anything else counts zero.
#[must_use]
pub fn item_count(data: &Value) -> usize {
    match data {
        Value::Array(rows) => rows.len(),
        other => other
            .get("items")
            .and_then(Value::as_array)
            .map_or(0, Vec::len),
    }
}

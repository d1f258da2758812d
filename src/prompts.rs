//! Instruction text and page formatting for the extraction request.
//!
//! The instruction and the page markers are a contract with the model: the
//! instruction tells it to read `pageNumber` from the `--- PÁGINA N ---`
//! markers, so [`format_pages`] and [`EXTRACTION_INSTRUCTION`] must change
//! together. Bump [`INSTRUCTION_VERSION`] whenever either does.

use crate::model::PageText;

/// Version tag of the instruction/marker contract, logged with each request.
pub const INSTRUCTION_VERSION: &str = "2024-05-v1";

/// System instruction sent with every extraction request.
pub const EXTRACTION_INSTRUCTION: &str = r#"Eres un analista legal experto especializado en la legislación peruana. Tu tarea es analizar el texto del diario oficial "El Peruano" que te proporcionaré. El texto está estructurado por páginas.

Debes realizar tres tareas principales:
1. Identificar la fecha de publicación principal del cuadernillo y ponerla en el campo 'gazetteDate'.
2. Extraer todas las normas legales (Resoluciones Ministeriales, Decretos Supremos, Leyes, etc.).
3. Identificar todos los movimientos de cargos públicos y clasificarlos en dos listas separadas: designados (nuevos nombramientos) y concluidos (renuncias aceptadas, ceses). Un mismo movimiento nunca figura en ambas listas.

Para cada norma legal extraída, proporciona la siguiente información:
- sector: El ministerio o sector gubernamental que emite la norma.
- normId: El identificador único de la norma.
- title: El título o sumilla de la norma.
- publicationDate: La fecha de publicación de la norma.
- summary: Un resumen conciso del propósito de la norma.
- relevanceToWaterSector: Clasifica la relevancia de la norma para el sector "Agua y Saneamiento" ('Alta', 'Media', 'Baja', 'Ninguna').
- pageNumber: El número de la página del PDF donde se encuentra la norma, basado en los marcadores "--- PÁGINA X ---".

Para cada movimiento de cargo público, tanto designado como concluido, proporciona:
- institution: La institución o entidad gubernamental (ej. Ministerio de Defensa, COFOPRI, PROINVERSION).
- personName: El nombre completo de la persona.
- position: El cargo o posición afectado.
- summary: Un resumen breve de la acción.

Analiza el siguiente texto y devuelve los resultados en el formato JSON especificado."#;

/// Prefix of the user turn, followed by the page-marked text.
pub const USER_PREFIX: &str = "Aquí está el texto del diario: ";

/// Wrap one page in its begin/end markers.
pub fn page_block(page: &PageText) -> String {
    format!(
        "--- PÁGINA {n} ---\n{text}\n--- FIN PÁGINA {n} ---",
        n = page.page_number,
        text = page.text
    )
}

/// Concatenate pages in order, separated by a blank line.
pub fn format_pages(pages: &[PageText]) -> String {
    pages.iter().map(page_block).collect::<Vec<_>>().join("\n\n")
}

/// The complete user turn for an extraction request.
pub fn user_message(pages: &[PageText]) -> String {
    format!("{USER_PREFIX}{}", format_pages(pages))
}

// Quote assistant prompt templates.
// All system prompt text is defined here.

use serde::{Deserialize, Serialize};

use crate::config::ColumnsConfig;
use crate::sheets::PricingTables;

/// Which extras columns are embedded and how answers are laid out
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptVariant {
    /// Full extras projection, four-field answer
    #[default]
    Detailed,
    /// Title, price, description and category only, three-field answer
    Compact,
}

/// Instruction text, kept in Italian to match the sheets and the expected answers
pub const QUOTE_INSTRUCTIONS: &str = "\
Sei l'Assistente Tecnico Payroll di riferimento. Il tuo compito è fornire preventivi e \
verifiche basandoti ESCLUSIVAMENTE sui dati forniti.

GERARCHIA DELLE FONTI (Ordine tassativo):
1. FOGLIO INCLUSIONI: Se l'attività è citata qui o rientra nel \"Payroll All-inclusive\", \
dichiara: \"STATO: Incluso (Gratuito)\".
2. FOGLIO EXTRA: Se non è inclusa, cerca nel listino Extra. Se la trovi, è un \"Extra Tipizzato\".
3. ANALOGIA: Se non trovi la voce esatta, cerca nel listino Extra attività simili per \
categoria o natura.
4. REGOLA GENERALE (Protocollo 20/30): Se l'attività non è a listino e non trovi analogie, \
applica questa regola: \"Se la pratica richiede più di 20 minuti per dipendente, il costo è \
di 30€ a dipendente\".

REGOLE DI RIGORE:
- NO ALLUCINAZIONI: Se non conosci un acronimo (es. VIG) e non è nei file forniti, NON \
inventare il significato. Rispondi: \"Acronimo non trovato nel database ufficiale, specifica \
di cosa si tratta\".
- PREZZO FISSO VS VARIABILE: 'Fisso' se c'è solo il prezzo unitario. 'Variabile' se ci sono \
moltiplicatori (a cedolino, all'ora, a pratica, ecc.).
- CALCOLO ARITMETICO: Mostra sempre i passaggi (es. 30€ x 10 dipendenti = 300€).
- INCERTEZZA DATI: Se non sai quanti sono i dipendenti, NON inventare un numero. Chiedi: \
\"Per quanti dipendenti dobbiamo calcolare l'attività?\".
- DISCLAIMER: Per ogni preventivo basato su analogia o regola 20/30, aggiungi: \
\"Nota: Stima basata su protocollo extra non codificati, soggetta a conferma\".";

const DETAILED_RESPONSE_FORMAT: &str = "\
- ANALISI: [Breve spiegazione di dove hai trovato l'informazione]
- STATO: [Incluso / Extra Tipizzato / Extra NON Tipizzato]
- TIPO PREZZO: [Gratuito / Prezzo Fisso / Prezzo Variabile / Regola 20-30]
- CALCOLO: [Dettaglio matematico chiaro]";

const COMPACT_RESPONSE_FORMAT: &str = "\
- ANALISI: [Breve spiegazione di dove hai trovato l'informazione]
- STATO: [Incluso / Extra Tipizzato / Extra NON Tipizzato]
- PREZZO: [Gratuito, oppure l'importo con il calcolo]";

impl PromptVariant {
    /// Extras columns embedded in the prompt, in order
    pub fn extra_columns(&self, columns: &ColumnsConfig) -> Vec<String> {
        match self {
            PromptVariant::Detailed => vec![
                columns.title_clean(),
                columns.price.clone(),
                columns.description.clone(),
                columns.responsible.clone(),
                columns.multiplier.clone(),
                columns.range.clone(),
                columns.notes.clone(),
                columns.category.clone(),
            ],
            PromptVariant::Compact => vec![
                columns.title_clean(),
                columns.price.clone(),
                columns.description.clone(),
                columns.category.clone(),
            ],
        }
    }

    pub fn response_format(&self) -> &'static str {
        match self {
            PromptVariant::Detailed => DETAILED_RESPONSE_FORMAT,
            PromptVariant::Compact => COMPACT_RESPONSE_FORMAT,
        }
    }
}

/// System turn embedding the Included table and the extras projection
pub fn build_system_prompt(
    tables: &PricingTables,
    columns: &ColumnsConfig,
    variant: PromptVariant,
) -> String {
    let extra_columns = variant.extra_columns(columns);
    let extra_columns: Vec<&str> = extra_columns.iter().map(String::as_str).collect();

    format!(
        "{}\n\n---\nDATABASE INCLUSIONI:\n{}\n\nDATABASE EXTRA:\n{}\n---\n\nSTRUTTURA OBBLIGATORIA RISPOSTA:\n{}",
        QUOTE_INSTRUCTIONS,
        tables.included.to_plain_text(),
        tables.extras.select(&extra_columns).to_plain_text(),
        variant.response_format(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheets::{normalize, normalize_extras, Table};
    use chrono::Utc;

    fn tables() -> PricingTables {
        let extras = Table::from_csv(
            "TITOLO,PREZZO,DESCRIZIONE,RESPONSABILE,MOLTIPLICATORE,CATEGORIA\n\
             **F24 credit entry**,25,handles credit offsets,Payroll Service,per F24,Tax\n",
        )
        .unwrap();
        let included = Table::from_csv("CATEGORIA,DETTAGLIO\nPaghe,Monthly payslips\n").unwrap();

        PricingTables {
            plans: Table::default(),
            included: normalize(&included),
            extras: normalize_extras(&extras, "TITOLO"),
            loaded_at: Utc::now(),
        }
    }

    #[test]
    fn test_detailed_prompt_embeds_tables() {
        let prompt = build_system_prompt(&tables(), &ColumnsConfig::default(), PromptVariant::Detailed);

        assert!(prompt.starts_with(QUOTE_INSTRUCTIONS));
        assert!(prompt.contains("Monthly payslips"));
        assert!(prompt.contains("F24 credit entry"));
        assert!(prompt.contains("MOLTIPLICATORE"));
        assert!(prompt.contains("STATO: Incluso (Gratuito)"));
        assert!(prompt.contains("- TIPO PREZZO:"));
        assert!(prompt.contains("- CALCOLO:"));
        // Only the cleaned title is embedded
        assert!(!prompt.contains("**F24"));
    }

    #[test]
    fn test_compact_prompt_projects_fewer_columns() {
        let prompt = build_system_prompt(&tables(), &ColumnsConfig::default(), PromptVariant::Compact);

        assert!(prompt.contains("TITOLO_CLEAN"));
        assert!(!prompt.contains("RESPONSABILE"));
        assert!(!prompt.contains("MOLTIPLICATORE"));
        assert!(prompt.contains("- PREZZO: "));
        assert!(!prompt.contains("- CALCOLO:"));
    }

    #[test]
    fn test_prompt_sections_follow_instructions() {
        let prompt = build_system_prompt(&tables(), &ColumnsConfig::default(), PromptVariant::Detailed);

        let included = prompt.find("DATABASE INCLUSIONI:").unwrap();
        let extras = prompt.find("DATABASE EXTRA:").unwrap();
        let structure = prompt.find("STRUTTURA OBBLIGATORIA RISPOSTA:").unwrap();
        assert!(QUOTE_INSTRUCTIONS.len() < included);
        assert!(included < extras && extras < structure);
        assert!(prompt.ends_with("- CALCOLO: [Dettaglio matematico chiaro]"));
    }

    #[test]
    fn test_extra_columns_use_cleaned_title() {
        let columns = PromptVariant::Compact.extra_columns(&ColumnsConfig::default());
        assert_eq!(columns, vec!["TITOLO_CLEAN", "PREZZO", "DESCRIZIONE", "CATEGORIA"]);
    }

    #[test]
    fn test_variant_deserializes_lowercase() {
        let variant: PromptVariant = serde_json::from_str("\"compact\"").unwrap();
        assert_eq!(variant, PromptVariant::Compact);
    }
}

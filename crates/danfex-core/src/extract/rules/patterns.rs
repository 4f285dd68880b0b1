//! Common regex patterns for DANFE field extraction.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // CNPJ: XX.XXX.XXX/XXXX-XX, punctuation optional
    pub static ref CNPJ_PATTERN: Regex = Regex::new(
        r"\b\d{2}\.?\d{3}\.?\d{3}/?\d{4}-?\d{2}\b"
    ).unwrap();

    // CPF: XXX.XXX.XXX-XX, punctuation optional
    pub static ref CPF_PATTERN: Regex = Regex::new(
        r"\b\d{3}\.?\d{3}\.?\d{3}-?\d{2}\b"
    ).unwrap();

    // Access key: 44 digits, optionally grouped in blocks of four
    pub static ref ACCESS_KEY_PATTERN: Regex = Regex::new(
        r"\b(?:\d{4}\s?){10}\d{4}\b"
    ).unwrap();

    // Invoice number, labeled
    pub static ref INVOICE_NUMBER: Regex = Regex::new(
        r"(?i)(?:N[ºo°.]?\s*:?\s*|NF-?e?\s*:?\s*N[ºo°.]?\s*:?\s*|NUMERO\s*:?\s*)(\d{1,9})"
    ).unwrap();

    // Series, labeled
    pub static ref SERIES: Regex = Regex::new(
        r"(?i)S[ÉE]RIE[:\s]*(\d{1,3})"
    ).unwrap();

    // Date: DD/MM/YYYY with /, - or . separators
    pub static ref DATE_DMY: Regex = Regex::new(
        r"\b(\d{2})[/\-.](\d{2})[/\-.](\d{4})\b"
    ).unwrap();

    // Labeled dates
    pub static ref ISSUE_DATE: Regex = Regex::new(
        r"(?i)(?:DATA\s*(?:DE\s*)?EMISS[ÃA]O|EMISS[ÃA]O)[:\s]*(\d{2}[/\-.]\d{2}[/\-.]\d{4})"
    ).unwrap();

    pub static ref DEPARTURE_DATE: Regex = Regex::new(
        r"(?i)(?:DATA\s*(?:DE\s*)?SA[ÍI]DA(?:\s*/\s*ENTRADA)?|SA[ÍI]DA)[:\s]*(\d{2}[/\-.]\d{2}[/\-.]\d{4})"
    ).unwrap();

    // Monetary amount: R$ X.XXX,XX (thousands '.' or space, decimal ',')
    pub static ref AMOUNT_PATTERN: Regex = Regex::new(
        r"R?\$?\s*(\d{1,3}(?:[.\s]?\d{3})*[,.]\d{2})\b"
    ).unwrap();

    // Labeled amounts
    pub static ref TOTAL_VALUE: Regex = Regex::new(
        r"(?i)(?:VALOR\s*TOTAL\s*(?:DA\s*)?(?:NF|NOTA)?|V\.?\s*TOTAL\s*(?:DA\s*)?NF)[:\s]*R?\$?\s*(\d{1,3}(?:[.\s]?\d{3})*[,.]\d{2})"
    ).unwrap();

    pub static ref GOODS_VALUE: Regex = Regex::new(
        r"(?i)(?:VALOR\s*(?:TOTAL\s*)?(?:DOS\s*)?PRODUTOS|V\.?\s*PROD)[:\s]*R?\$?\s*(\d{1,3}(?:[.\s]?\d{3})*[,.]\d{2})"
    ).unwrap();

    pub static ref FREIGHT_VALUE: Regex = Regex::new(
        r"(?i)(?:VALOR\s*(?:DO\s*)?FRETE|V\.?\s*FRETE)[:\s]*R?\$?\s*(\d{1,3}(?:[.\s]?\d{3})*[,.]\d{2})"
    ).unwrap();

    pub static ref INSURANCE_VALUE: Regex = Regex::new(
        r"(?i)(?:VALOR\s*(?:DO\s*)?SEGURO|V\.?\s*SEGURO)[:\s]*R?\$?\s*(\d{1,3}(?:[.\s]?\d{3})*[,.]\d{2})"
    ).unwrap();

    pub static ref TAX_VALUE: Regex = Regex::new(
        r"(?i)(?:(?:VALOR\s*(?:DO\s*)?)?ICMS|V\.?\s*ICMS)[:\s]*R?\$?\s*(\d{1,3}(?:[.\s]?\d{3})*[,.]\d{2})"
    ).unwrap();

    // State registration (inscricao estadual)
    pub static ref STATE_REGISTRATION: Regex = Regex::new(
        r"(?i)(?:INSCRI[ÇC][ÃA]O\s*ESTADUAL|\bI\.?E\.?)[:\s]*(\d[\d./-]*\d)"
    ).unwrap();

    // Party names, windowed between their label and the next field label
    pub static ref ISSUER_NAME: Regex = Regex::new(
        r"(?i)(?:RAZ[ÃA]O\s*SOCIAL|NOME\s*/\s*RAZ[ÃA]O\s*SOCIAL)[:\s]*([A-ZÀ-Ú][A-ZÀ-Ú0-9\s.\-&]+?)\s*(?:CNPJ|CPF|INSCRI|ENDERE|DATA|$)"
    ).unwrap();

    pub static ref RECIPIENT_NAME: Regex = Regex::new(
        r"(?i)(?:DESTINAT[ÁA]RIO|DEST\.?\s*/\s*REM\.?)[:\s]*(?:NOME[:\s]*)?([A-ZÀ-Ú][A-ZÀ-Ú0-9\s.\-&]+?)\s*(?:CNPJ|CPF|INSCRI|ENDERE|DATA|$)"
    ).unwrap();
}

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PostError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Locale {
    #[serde(rename = "en-us")]
    EnUs,
    #[serde(rename = "fr-fr")]
    FrFr,
    #[serde(rename = "es-es")]
    EsEs,
}

impl Locale {
    pub const ALL: [Locale; 3] = [Locale::EnUs, Locale::FrFr, Locale::EsEs];

    pub fn id(self) -> &'static str {
        match self {
            Locale::EnUs => "en-us",
            Locale::FrFr => "fr-fr",
            Locale::EsEs => "es-es",
        }
    }

    pub fn labels(self) -> &'static Labels {
        match self {
            Locale::EnUs => &EN_US,
            Locale::FrFr => &FR_FR,
            Locale::EsEs => &ES_ES,
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Locale {
    type Err = PostError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Locale::ALL
            .into_iter()
            .find(|locale| locale.id().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| PostError::UnsupportedLocale(s.to_string()))
    }
}

/// User-interface strings of the reference mill dialect for one language.
#[derive(Debug)]
pub struct Labels {
    pub description: &'static str,
    pub numbering: &'static str,
    pub increment: &'static str,
    pub condensed: &'static str,
    pub decimals: &'static str,
    pub extension: &'static str,
    pub comments: &'static str,
    pub header: &'static str,
    pub footer: &'static str,
    pub relative_arcs: &'static str,
    pub unit: &'static str,
    pub millimeter: &'static str,
    pub inch: &'static str,
}

static EN_US: Labels = Labels {
    description: "Generic Mill/Router",
    numbering: "Numbering lines",
    increment: "Increment",
    condensed: "Condensed",
    decimals: "Decimals number",
    extension: "File extension",
    comments: "Output comments",
    header: "File header",
    footer: "File footer",
    relative_arcs: "IJK Relative",
    unit: "Unit",
    millimeter: "Millimeter",
    inch: "Inch",
};

static FR_FR: Labels = Labels {
    description: "Mill/Router Générique",
    numbering: "Numéroter les lignes",
    increment: "Incrémentation",
    condensed: "Condensé",
    decimals: "Nombre de décimales",
    extension: "Extension du fichier",
    comments: "Générer les commentaires",
    header: "Début de fichier",
    footer: "Fin du fichier",
    relative_arcs: "IJK Relatif",
    unit: "Unité",
    millimeter: "Millimètre",
    inch: "Pouce",
};

static ES_ES: Labels = Labels {
    description: "Mill/Router Genérico",
    numbering: "Numeración de las líneas",
    increment: "Incrementación",
    condensed: "Condensado",
    decimals: "Decimales",
    extension: "Extensión del archivo",
    comments: "Generar los comentarios",
    header: "Principio",
    footer: "Fin",
    relative_arcs: "IJK Relativo",
    unit: "Unidad",
    millimeter: "Milímetro",
    inch: "Pulgada",
};

/// Feature type of gene expression features.
pub const DEFAULT_LIBRARY_TYPE: &str = "Gene Expression";

/// Feature tag holding the reference genome of a gene.
pub const GENOME_TAG: &str = "genome";

/// Separator between the sequence part and the gem group of a barcode.
pub const BARCODE_GEM_GROUP_SEPARATOR: char = '-';

//! Prompt templates for the schema inference API.

use crate::table::Frame;

use super::OracleFeedback;

/// System prompt establishing the inference task and output contract.
pub fn system_prompt() -> &'static str {
    r#"You are an expert data analyst specializing in data type inference and
schema detection for tabular data.

Given a sample of raw CSV rows, infer for every column the most
appropriate data type and the regex cleaning pattern used to strip
problematic characters before casting.

Data types:
1. "string" - text, IDs, categories, any non-numeric data
2. "datetime" - temporal data, either a complete timestamp or a single
   part of one (year, month, day, hour, minute, second)
3. "integer" - whole numbers that are not datetime parts
4. "float" - decimal numbers, currency values, percentages, measurements
5. "boolean" - true/false, yes/no, 1/0, binary categorical data

Cleaning patterns:
1. Never use lookahead or lookbehind assertions.
2. Write the pattern as a negated character class [^...] listing the
   characters that should remain after cleaning. Example: [^0-9.-]
   keeps digits, decimal points and hyphens for float data like -100.00.
3. Use an empty string when no cleaning is needed.

Guidelines:
- Look for patterns in the data (currency symbols, date formats).
- Use the column names and value ranges as context.
- Whole-number columns that represent dates or datetime parts (e.g. a
  "day" column with values 1-31) are datetime parts, not integers.
- Preserve ID fields as strings even when they contain only digits.
- Be conservative: when in doubt, choose "string".
- Do not retain grouping commas when parsing numeric data.

Datetime columns:
- Set "datetime_format" (strftime syntax) for any column parsed as a
  complete datetime.
- Set "partial_datetime_schema" for columns holding a single part of a
  date or datetime, assigning parts that belong together a shared
  "parent_column_name" so they can be fused into one column.

Respond with a JSON array, one object per column, in column order:
[
  {
    "name": "...",
    "data_type": "string|integer|float|boolean|datetime",
    "regex_cleaning_pattern": "...",
    "datetime_format": "..." (optional),
    "partial_datetime_schema": {"part": "year|month|day|hour|minute|second",
                                "parent_column_name": "..."} (optional)
  }
]
Respond with the JSON array only."#
}

/// Build the per-request prompt: the sampled rows plus any validation
/// failure from the previous attempt.
pub fn inference_prompt(sample: &Frame, feedback: Option<&OracleFeedback>) -> String {
    let columns = sample.column_names().join(", ");
    let records = serde_json::to_string_pretty(&sample.to_records(0, sample.height()))
        .unwrap_or_else(|_| "[]".to_string());

    let mut prompt = format!(
        "Columns: {}\n\nSample rows:\n{}\n\nInfer the schema for every column.",
        columns, records
    );

    if let Some(failure) = feedback {
        prompt.push_str(&format!(
            "\n\nYour previous schema failed validation for column '{}': {}\n\
             Correct that column's schema and return the full schema again.",
            failure.column, failure.reason
        ));
    }

    prompt
}

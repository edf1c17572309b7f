//! Fixed prompt pair sent with every page image.
//!
//! Both prompts live here so that the JSON shape the model is asked for can
//! be checked against [`crate::record::LabTestRecord`] in one place.

/// System instruction: the task and the meaning of each field.
pub const SYSTEM_PROMPT: &str = r#"You are a medical lab report parser. Your task is to extract lab test results from PDF documents.
You must analyze the content and identify:
- Test names
- Test categories (e.g., Hormones, Lipids, etc.)
- Numerical values and units
- Reference ranges
- Whether results are normal, high, or low based on the reference ranges
- Test dates

You must respond with ONLY a JSON array in the specified format, with no additional text."#;

/// User instruction: the exact target shape and the extraction rules.
pub const USER_PROMPT: &str = r#"Please analyze this lab report and extract all test results.
For each test result found, include:
1. The exact test name as shown
2. The appropriate category for the test
3. The numerical value and unit
4. The reference range exactly as shown
5. Whether the result is normal, high, or low
6. The test date if available (use the report date if individual test dates aren't shown)

Return the data in this exact JSON format:
[
  {
    "test": "Test Name",
    "category": "Test Category",
    "result": "Numerical Value",
    "reference_min": "Minimum Reference Value",
    "reference_max": "Maximum Reference Value",
    "payor_code": "Payor Code",
    "status": "normal/high/low",
    "test_date": "YYYY-MM-DD"
  }
]

Important:
- Include ALL test results found in the document
- Use EXACTLY the format shown
- Return ONLY the JSON array, no other text
- Determine status based on whether the value is within, above, or below the reference range"#;

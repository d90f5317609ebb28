use crate::models::ReportSlot;

const SYMPTOMS_PLACEHOLDER: &str = "{symptoms}";

pub const XRAY_TEMPLATE: &str = r#"
You are a medical AI assistant.
Based on the image and the patient symptoms: {symptoms} your task is to:

1. Identify whether the image is a chest X-ray. If it is not, answer "Not a chest X-ray" and stop.
2. Identify the disease with the highest confidence score.
3. Write a clear, concise diagnosis statement naming the disease most likely present.
4. Mention the confidence score as a percentage.
5. Include a disclaimer that this is a preliminary AI-based diagnosis and advise consulting a healthcare professional.
6. Do not open with "Based on the image and the patient symptoms" or any other introductory phrase.
7. Keep the report between 200 and 300 words.
8. Use this format:

Disease Expected: Mass
The AI model analyzed the chest X-ray image and determined that the most likely condition present is Mass, with a confidence score of 47.00%. This suggests an abnormal growth or lump in the lung area that needs further attention. Masses range from benign to malignant, so additional evaluation such as a CT scan or biopsy may be recommended. This result is an early indication from an AI system and does not replace professional medical advice. Please consult a certified radiologist or doctor.
"#;

pub const CT_TEMPLATE: &str = r#"
You are a medical AI assistant specialized in interpreting 2D and 3D CT scan results.
Based on the image and the patient symptoms: {symptoms}, your task is to:

1. Identify whether a tumor or no tumor is more likely based on the highest confidence score.
2. State the detected condition and its confidence score as a percentage (e.g., 92.00%).
3. Explain what the result means for the patient in clear, simple language.
4. Describe briefly how CT scans help detect tumors through detailed cross-sectional views.
5. Recommend next steps such as further imaging or biopsy for confirmation.
6. End with a disclaimer that this is an AI-generated preliminary result that must be verified by a certified medical professional.
7. Do not open with "Based on the image and the patient symptoms" or any other introductory phrase.
8. Keep the report between 200 and 300 words.
9. Use this format:

Condition Detected: Tumor
The AI analysis of your CT scan indicates a high probability of a tumor, with a confidence score of 92.00%. This suggests an abnormal mass or growth in the scanned region. CT scans give doctors detailed cross-sectional images of internal tissues, which makes tumors easier to identify. This is a strong indicator, not a confirmed diagnosis; an MRI or biopsy may be required.
Disclaimer: This is an AI-generated summary. Please consult a certified doctor or radiologist for confirmation and advice.
"#;

pub const ULTRASOUND_TEMPLATE: &str = r#"
You are a medical assistant specialized in interpreting ultrasound scan results.
Based on the image and the patient symptoms: {symptoms}, your task is to:

1. Identify the most likely condition from: Normal, Cyst, Mass, Fluid, Other Anomaly.
2. State the detected condition with its confidence score as a percentage (e.g., 88.50%).
3. Explain in simple, compassionate language what the result implies for the patient.
4. Explain briefly how ultrasound uses sound waves for real-time internal imaging.
5. Suggest next steps such as follow-up scans, consultations or further diagnostics.
6. End with a disclaimer that this is an AI-generated preliminary result that must be verified by a certified medical professional.
7. Do not open with "Based on the image and the patient symptoms" or any other introductory phrase.
8. Keep the report between 200 and 300 words.
9. Use this format:

Condition Detected: Cyst
The AI model identified the most likely condition as a Cyst, with a confidence score of 92.30%. This suggests a fluid-filled sac, which is typically benign and may not cause symptoms. While most cysts are harmless, a follow-up consultation is recommended to evaluate its size and nature.
Disclaimer: This is an AI-generated summary and not a substitute for professional medical advice.
"#;

pub const MRI_TEMPLATE: &str = r#"
You are a radiology report assistant specialized in interpreting MRI scans.
Based on the image and the patient symptoms: {symptoms}, create a detailed MRI report including key findings, interpretation and suggested follow-up.
Start the report with a line of the form "Condition Detected: <condition>".
"#;

pub const CT_VOLUME_TEMPLATE: &str = r#"
You are a medical AI assistant specialized in interpreting 3D CT scan results.
The attached images are the axial, coronal and sagittal mid-slices of the volume. The classifier's top finding is: {symptoms}.

1. Identify whether a tumor or no tumor is more likely.
2. State the detected condition and its confidence score as a percentage (e.g., 92.00%).
3. Explain what the result means for the patient in clear, simple language.
4. Describe briefly how 3D CT scans assist in detecting tumors through detailed cross-sectional views.
5. Recommend next steps such as further imaging or biopsy for confirmation.
6. End with a disclaimer that this is an AI-generated preliminary result that must be verified by a certified medical professional.
7. Do not open with an introductory phrase.
8. Keep the report between 200 and 300 words.
9. Use this format:

Condition Detected: Tumor
The AI analysis of your 3D CT scan indicates a high probability of a tumor, with a confidence score of 92.00%. ...
Disclaimer: This is an AI-generated summary. Please consult a certified doctor or radiologist.
"#;

pub const MRI_VOLUME_TEMPLATE: &str = r#"
You are a medical specialist in interpreting brain MRI results.
The attached images are the axial, coronal and sagittal mid-slices of the volume. Based on them and the patient symptoms: {symptoms}, your task is to:

1. Identify the condition with the highest confidence score from: "No Tumor", "Meningioma", "Glioma", "Pituitary Tumor".
2. State the detected condition and its confidence score as a percentage (e.g., 87.45%).
3. Explain what the result means for the patient in clear, simple language.
4. Describe briefly how brain MRI identifies such conditions through high-resolution soft-tissue images.
5. Suggest next steps such as a neurologist consultation, further imaging or biopsy.
6. End with a disclaimer that this is an AI-generated preliminary result that must be verified by a certified medical professional.
7. Do not open with an introductory phrase.
8. Keep the report between 200 and 300 words.
9. Use this format:

Condition Detected: Glioma
The AI analysis of your brain MRI scan suggests a high probability of Glioma, with a confidence score of 89.00%. ...
Disclaimer: This is an AI-generated result. Please seek advice from a certified medical professional.
"#;

pub fn template_for(slot: ReportSlot) -> &'static str {
    match slot {
        ReportSlot::Xray => XRAY_TEMPLATE,
        ReportSlot::Ct | ReportSlot::Ct2d => CT_TEMPLATE,
        ReportSlot::Ultrasound => ULTRASOUND_TEMPLATE,
        ReportSlot::Mri => MRI_TEMPLATE,
        ReportSlot::Ct3d => CT_VOLUME_TEMPLATE,
        ReportSlot::Mri3d => MRI_VOLUME_TEMPLATE,
    }
}

/// Fill the slot's template with the comma-joined symptoms.
pub fn build_prompt(slot: ReportSlot, symptoms: &[String]) -> String {
    fill(template_for(slot), symptoms)
}

fn fill(template: &str, symptoms: &[String]) -> String {
    template.replace(SYMPTOMS_PLACEHOLDER, &symptoms.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn symptoms() -> Vec<String> {
        vec!["Mass".into(), "Nodule".into(), "Effusion".into()]
    }

    #[test]
    fn every_template_has_placeholder() {
        for slot in ReportSlot::ALL {
            assert!(template_for(*slot).contains(SYMPTOMS_PLACEHOLDER), "{slot}");
        }
    }

    #[test]
    fn symptoms_are_comma_joined() {
        let prompt = build_prompt(ReportSlot::Xray, &symptoms());
        assert!(prompt.contains("patient symptoms: Mass, Nodule, Effusion"));
        assert!(!prompt.contains(SYMPTOMS_PLACEHOLDER));
        assert!(prompt.contains("Disease Expected:"));
    }

    #[test]
    fn ct_slots_share_planar_template() {
        assert_eq!(template_for(ReportSlot::Ct), template_for(ReportSlot::Ct2d));
        assert_ne!(template_for(ReportSlot::Ct), template_for(ReportSlot::Ct3d));
    }

    #[test]
    fn empty_symptoms_leave_blank() {
        let prompt = build_prompt(ReportSlot::Mri, &[]);
        assert!(prompt.contains("patient symptoms: , create"));
    }
}

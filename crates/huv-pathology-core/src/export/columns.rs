//! Output column names. Order and spelling are a compatibility contract
//! with the downstream spreadsheet.

use crate::models::BIOMARKER_COLUMNS;

pub const NUMERO_PETICION: &str = "N. peticion (0. Numero de biopsia)";
pub const HOSPITALIZADO: &str = "Hospitalizado";
pub const SEDE: &str = "Sede";
pub const EPS: &str = "EPS";
pub const SERVICIO: &str = "Servicio";
pub const MEDICO_TRATANTE: &str = "Médico tratante";
pub const ESPECIALIDAD: &str = "Especialidad";
pub const UBICACION: &str = "Ubicación";
pub const N_AUTORIZACION: &str = "N. Autorizacion";
pub const IDENTIFICADOR_UNICO: &str = "Identificador Unico";
pub const DATOS_CLINICOS: &str = "Datos Clinicos";
pub const FECHA_ORDENAMIENTO: &str = "Fecha ordenamiento";
pub const TIPO_DOCUMENTO: &str = "Tipo de documento";
pub const N_IDENTIFICACION: &str = "N. de identificación";
pub const PRIMER_NOMBRE: &str = "Primer nombre";
pub const SEGUNDO_NOMBRE: &str = "Segundo nombre";
pub const PRIMER_APELLIDO: &str = "Primer apellido";
pub const SEGUNDO_APELLIDO: &str = "Segundo apellido";
pub const FECHA_NACIMIENTO: &str = "Fecha de nacimiento";
pub const EDAD: &str = "Edad";
pub const GENERO: &str = "Genero";
pub const NUMERO_CELULAR: &str = "Número celular";
pub const CORREO: &str = "Direccion de correo electronico";
pub const CORREO_2: &str = "Direccion de correo electronico 2";
pub const CONTACTO_EMERGENCIA: &str = "Contacto de emergencia";
pub const DEPARTAMENTO: &str = "Departamento";
pub const TELEFONO_CONTACTO: &str = "Teléfono del contacto";
pub const MUNICIPIO: &str = "Municipio";
pub const N_MUESTRA: &str = "N. muestra";
pub const CUPS: &str = "CUPS";
pub const TIPO_EXAMEN: &str =
    "Tipo de examen (4, 12, Metodo de obtención de la muestra, factor de certeza para el diagnóstico)";
pub const PROCEDIMIENTO: &str = "Procedimiento (11. Tipo de estudio para el diagnóstico)";
pub const ORGANO: &str = "Organo (1. Muestra enviada a patología)";
pub const TARIFA: &str = "Tarifa";
pub const VALOR: &str = "Valor";
pub const COPAGO: &str = "Copago";
pub const DESCUENTO: &str = "Descuento";
pub const FECHA_INGRESO: &str = "Fecha de ingreso (2. Fecha de la muestra)";
pub const FECHA_FINALIZACION: &str = "Fecha finalizacion (3. Fecha del informe)";
pub const USUARIO_FINALIZACION: &str = "Usuario finalizacion";
pub const USUARIO_ASIGNACION_MICRO: &str = "Usuario asignacion micro";
pub const FECHA_ASIGNACION_MICRO: &str = "Fecha asignacion micro";
pub const MALIGNIDAD: &str = "Malignidad";
pub const CONDICION: &str = "Condicion";
pub const DESCRIPCION_MACROSCOPICA: &str = "Descripcion macroscopica";
pub const DESCRIPCION_MICROSCOPICA: &str = "Descripcion microscopica (8,9, 10,12,. Invasión linfovascular y perineural, indice mitótico/Ki67, Inmunohistoquímica, tamaño tumoral)";
pub const DESCRIPCION_DIAGNOSTICO: &str =
    "Descripcion Diagnostico (5,6,7 Tipo histológico, subtipo histológico, margenes tumorales)";
pub const DIAGNOSTICO_PRINCIPAL: &str = "Diagnostico Principal";
pub const COMENTARIO: &str = "Comentario";
pub const INFORME_ADICIONAL: &str = "Informe adicional";
pub const CONGELACIONES: &str = "Congelaciones /Otros estudios";
pub const LIQUIDOS: &str = "Liquidos (5 Tipo histologico)";
pub const CITOMETRIA: &str = "Citometria de flujo (5 Tipo histologico)";
pub const HORA_DESC_MACRO: &str = "Hora Desc. macro";
pub const RESPONSABLE_MACRO: &str = "Responsable macro";

/// The 55 output columns, in spreadsheet order.
pub const COLUMNS: [&str; 55] = [
    NUMERO_PETICION,
    HOSPITALIZADO,
    SEDE,
    EPS,
    SERVICIO,
    MEDICO_TRATANTE,
    ESPECIALIDAD,
    UBICACION,
    N_AUTORIZACION,
    IDENTIFICADOR_UNICO,
    DATOS_CLINICOS,
    FECHA_ORDENAMIENTO,
    TIPO_DOCUMENTO,
    N_IDENTIFICACION,
    PRIMER_NOMBRE,
    SEGUNDO_NOMBRE,
    PRIMER_APELLIDO,
    SEGUNDO_APELLIDO,
    FECHA_NACIMIENTO,
    EDAD,
    GENERO,
    NUMERO_CELULAR,
    CORREO,
    CORREO_2,
    CONTACTO_EMERGENCIA,
    DEPARTAMENTO,
    TELEFONO_CONTACTO,
    MUNICIPIO,
    N_MUESTRA,
    CUPS,
    TIPO_EXAMEN,
    PROCEDIMIENTO,
    ORGANO,
    TARIFA,
    VALOR,
    COPAGO,
    DESCUENTO,
    FECHA_INGRESO,
    FECHA_FINALIZACION,
    USUARIO_FINALIZACION,
    USUARIO_ASIGNACION_MICRO,
    FECHA_ASIGNACION_MICRO,
    MALIGNIDAD,
    CONDICION,
    DESCRIPCION_MACROSCOPICA,
    DESCRIPCION_MICROSCOPICA,
    DESCRIPCION_DIAGNOSTICO,
    DIAGNOSTICO_PRINCIPAL,
    COMENTARIO,
    INFORME_ADICIONAL,
    CONGELACIONES,
    LIQUIDOS,
    CITOMETRIA,
    HORA_DESC_MACRO,
    RESPONSABLE_MACRO,
];

/// The 55 columns followed by the 8 biomarker columns.
pub const EXTENDED_COLUMNS: [&str; 63] = {
    let mut columns = [""; 63];
    let mut i = 0;
    while i < COLUMNS.len() {
        columns[i] = COLUMNS[i];
        i += 1;
    }
    let mut j = 0;
    while j < BIOMARKER_COLUMNS.len() {
        columns[COLUMNS.len() + j] = BIOMARKER_COLUMNS[j];
        j += 1;
    }
    columns
};

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_column_count_and_uniqueness() {
        assert_eq!(COLUMNS.len(), 55);
        let unique: HashSet<&str> = COLUMNS.iter().copied().collect();
        assert_eq!(unique.len(), 55);
    }

    #[test]
    fn test_column_order_anchors() {
        assert_eq!(COLUMNS[0], "N. peticion (0. Numero de biopsia)");
        assert_eq!(COLUMNS[20], "Genero");
        assert_eq!(COLUMNS[28], "N. muestra");
        assert_eq!(COLUMNS[53], "Hora Desc. macro");
        assert_eq!(COLUMNS[54], "Responsable macro");
    }

    #[test]
    fn test_extended_columns() {
        assert_eq!(&EXTENDED_COLUMNS[..55], &COLUMNS[..]);
        assert_eq!(EXTENDED_COLUMNS[55], "IHQ_HER2");
        assert_eq!(EXTENDED_COLUMNS[62], "IHQ_P16_PORCENTAJE");
    }
}
